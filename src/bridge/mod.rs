//! # Stack Bridge
//!
//! Host-side helpers for LuaJIT's FFI, working directly on the value stack
//! of a caller-owned `lua_State`:
//!
//! - [`push_cdata_int64`] / [`push_cdata_uint64`] leave one boxed 64-bit
//!   integer on the stack
//! - [`ctype_id`] reports the `CTypeID` of the value on top of the stack, or
//!   [`CTypeId::NONE`] when it has no foreign type
//!
//! ## Stack discipline
//!
//! Every operation snapshots the stack height on entry and restores it on
//! every exit path through a [`StackGuard`]. The only residue ever left is
//! the single value a successful push produces.
//!
//! ## Ownership
//!
//! The bridge never creates, closes or caches a state. Each call takes the
//! handle explicitly and assumes exclusive use of it for its duration.

pub mod ctypeid;
pub mod errors;
pub mod lua_api;
pub mod push;
pub mod stack;

#[cfg(test)]
mod tests;

// Re-export commonly used items
pub use ctypeid::{ctype_id, CTypeId};
pub use errors::BridgeError;
pub use push::{push_cdata_int64, push_cdata_uint64};
pub use stack::StackGuard;
