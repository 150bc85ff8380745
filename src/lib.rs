//! Host-side helpers for LuaJIT's FFI
//!
//! Push 64-bit integers onto a LuaJIT stack as `int64_t`/`uint64_t` cdata,
//! and ask the interpreter for the `CTypeID` of whatever sits on top of the
//! stack.
//!
//! # Example
//!
//! ```no_run
//! use luajit_ctypeid::{CTypeId, LuaHost};
//!
//! let mut host = LuaHost::new()?;
//! host.push_int64(-42)?;
//! assert_eq!(host.ctype_id()?, CTypeId::INT64);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod bridge;
pub mod cli;
pub mod config;
pub mod host;
pub mod logging;

// Re-export main types
pub use bridge::{ctype_id, push_cdata_int64, push_cdata_uint64, BridgeError, CTypeId, StackGuard};
pub use config::Config;
pub use host::LuaHost;
