//! Pushing 64-bit integers as cdata
//!
//! LuaJIT's public C API has no cdata constructor, so the value is written
//! as an `LL`/`ULL` literal, compiled, and run once. The parser produces a
//! boxed `int64_t`/`uint64_t` directly from the literal, which keeps the full
//! 64-bit range that a `lua_Number` would lose.

use super::errors::BridgeError;
use super::stack::{load_and_call, Failure, StackGuard};
use mlua_sys::lua_State;
use tracing::trace;

const CHUNK_NAME: &std::ffi::CStr = c"=ctypeid.push";

/// Snippet evaluating to an `int64_t` cdata equal to `value`
pub fn int64_literal(value: i64) -> String {
    format!("return {value}LL")
}

/// Snippet evaluating to a `uint64_t` cdata equal to `value`
pub fn uint64_literal(value: u64) -> String {
    format!("return {value}ULL")
}

/// Push `value` onto the stack as an `int64_t` cdata
///
/// On success exactly one value is left above the entry height. On failure
/// the stack is back at the entry height.
///
/// # Safety
/// `state` must be a valid LuaJIT state with FFI support, used by no one
/// else for the duration of the call.
pub unsafe fn push_cdata_int64(state: *mut lua_State, value: i64) -> Result<(), BridgeError> {
    push_snippet(state, "push_cdata_int64", int64_literal(value))
}

/// Push `value` onto the stack as a `uint64_t` cdata
///
/// Same contract as [`push_cdata_int64`].
///
/// # Safety
/// See [`push_cdata_int64`].
pub unsafe fn push_cdata_uint64(state: *mut lua_State, value: u64) -> Result<(), BridgeError> {
    push_snippet(state, "push_cdata_uint64", uint64_literal(value))
}

unsafe fn push_snippet(
    state: *mut lua_State,
    op: &'static str,
    snippet: String,
) -> Result<(), BridgeError> {
    let guard = StackGuard::new(state);
    trace!(op, %snippet, top = guard.entry_top(), "pushing cdata literal");

    match load_and_call(state, &snippet, CHUNK_NAME, 1) {
        Ok(()) => {
            guard.keep(1);
            Ok(())
        }
        Err(Failure::Load(message)) => Err(BridgeError::Load {
            op,
            snippet,
            message,
        }),
        Err(Failure::Call(message)) => Err(BridgeError::Call { op, message }),
    }
}
