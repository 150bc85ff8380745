//! Stack discipline helpers
//!
//! [`StackGuard`] snapshots the stack height on creation and restores it when
//! dropped, so every early return (including `?`) leaves the stack balanced.
//! The remaining functions are thin wrappers over the load/call half of the
//! C API that turn Lua status codes into `Result`s carrying the error text.

use mlua_sys::{
    lua_State, lua_gettop, lua_pcall, lua_settop, lua_tolstring, lua_type, lua_typename,
    luaL_loadbuffer, LUA_OK,
};
use std::ffi::{c_int, CStr};

/* ===================== Stack Guard ===================== */

/// Restores the stack to its entry height on drop
///
/// Call [`StackGuard::keep`] on the one success path that intentionally
/// leaves values behind.
#[must_use = "the stack is restored when the guard is dropped"]
pub struct StackGuard {
    state: *mut lua_State,
    top: c_int,
}

impl StackGuard {
    /// Snapshot the current stack height
    ///
    /// # Safety
    /// `state` must be a valid Lua state that outlives the guard, and nothing
    /// else may pop below the snapshot while the guard is alive.
    pub unsafe fn new(state: *mut lua_State) -> Self {
        Self {
            state,
            top: lua_gettop(state),
        }
    }

    /// Stack height captured at entry
    pub fn entry_top(&self) -> c_int {
        self.top
    }

    /// Release the guard, leaving exactly `results` values above the entry
    /// height
    pub fn keep(self, results: c_int) {
        // SAFETY: validity of `state` is the contract of `StackGuard::new`.
        unsafe { lua_settop(self.state, self.top + results) };
        std::mem::forget(self);
    }
}

impl Drop for StackGuard {
    fn drop(&mut self) {
        // SAFETY: validity of `state` is the contract of `StackGuard::new`.
        unsafe { lua_settop(self.state, self.top) };
    }
}

/* ===================== Load / Call ===================== */

/// Compile `source` and push the resulting chunk
///
/// On failure the error message is popped and returned.
///
/// # Safety
/// `state` must be a valid Lua state.
pub unsafe fn load_chunk(state: *mut lua_State, source: &str, name: &CStr) -> Result<(), String> {
    let status = luaL_loadbuffer(state, source.as_ptr().cast(), source.len(), name.as_ptr());
    if status != LUA_OK {
        let message = error_message(state, -1);
        lua_settop(state, -2);
        return Err(message);
    }
    Ok(())
}

/// Protected call of the function below the top `nargs` values
///
/// On failure the error message is popped and returned.
///
/// # Safety
/// `state` must be a valid Lua state with a function and `nargs` arguments
/// on top of the stack.
pub unsafe fn pcall(state: *mut lua_State, nargs: c_int, nresults: c_int) -> Result<(), String> {
    let status = lua_pcall(state, nargs, nresults, 0);
    if status != LUA_OK {
        let message = error_message(state, -1);
        lua_settop(state, -2);
        return Err(message);
    }
    Ok(())
}

/// Compile `source`, run it with no arguments and keep `nresults` results
///
/// The `Err` side tells which half failed so callers can report compile and
/// runtime failures differently.
///
/// # Safety
/// `state` must be a valid Lua state.
pub unsafe fn load_and_call(
    state: *mut lua_State,
    source: &str,
    name: &CStr,
    nresults: c_int,
) -> Result<(), Failure> {
    load_chunk(state, source, name).map_err(Failure::Load)?;
    pcall(state, 0, nresults).map_err(Failure::Call)
}

/// Which half of [`load_and_call`] failed, with the interpreter's message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    Load(String),
    Call(String),
}

/* ===================== Inspection ===================== */

/// Lossy UTF-8 copy of the string (or number) at `idx`
///
/// `None` for any other type. Numbers are converted in place, as
/// `lua_tolstring` does.
///
/// # Safety
/// `state` must be a valid Lua state and `idx` an acceptable index.
pub unsafe fn string_at(state: *mut lua_State, idx: c_int) -> Option<String> {
    let mut len = 0usize;
    let ptr = lua_tolstring(state, idx, &mut len);
    if ptr.is_null() {
        return None;
    }
    let bytes = std::slice::from_raw_parts(ptr.cast::<u8>(), len);
    Some(String::from_utf8_lossy(bytes).into_owned())
}

/// Text of the error object at `idx`
///
/// # Safety
/// `state` must be a valid Lua state and `idx` an acceptable index.
pub unsafe fn error_message(state: *mut lua_State, idx: c_int) -> String {
    string_at(state, idx)
        .unwrap_or_else(|| format!("(error object is a {} value)", type_name(state, idx)))
}

/// Lua type name of the value at `idx`
///
/// # Safety
/// `state` must be a valid Lua state and `idx` an acceptable index.
pub unsafe fn type_name(state: *mut lua_State, idx: c_int) -> String {
    let name = lua_typename(state, lua_type(state, idx));
    if name.is_null() {
        return "no value".to_string();
    }
    CStr::from_ptr(name).to_string_lossy().into_owned()
}
