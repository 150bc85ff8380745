//! Lua-callable face of the bridge
//!
//! [`open`] pushes a table of C functions that scripts can call directly:
//!
//! ```lua
//! local id = ctypeid.typeid(ctypeid.int64("-42"))
//! ```
//!
//! Bridge failures surface as ordinary Lua errors, catchable with `pcall`.

use super::ctypeid::ctype_id;
use super::errors::BridgeError;
use super::push::{push_cdata_int64, push_cdata_uint64};
use mlua_sys::{
    lua_State, lua_createtable, lua_error, lua_pushcfunction, lua_pushlstring, lua_pushnumber,
    lua_setfield, lua_settop, luaL_argerror, luaL_checklstring, lua_CFunction,
};
use std::ffi::{c_int, CStr};
use std::str::FromStr;

const FUNCTIONS: [(&CStr, lua_CFunction); 3] = [
    (c"typeid", lua_typeid),
    (c"int64", lua_int64),
    (c"uint64", lua_uint64),
];

/// Push the bridge table onto the stack
///
/// # Safety
/// `state` must be a valid LuaJIT state with FFI support.
pub unsafe fn open(state: *mut lua_State) {
    lua_createtable(state, 0, FUNCTIONS.len() as c_int);
    for (name, func) in FUNCTIONS {
        lua_pushcfunction(state, func);
        lua_setfield(state, -2, name.as_ptr());
    }
}

/// `typeid(v)` -> type id of `v`, or 0
unsafe extern "C-unwind" fn lua_typeid(state: *mut lua_State) -> c_int {
    // A missing argument becomes nil, which typeof rejects like any non-ctype.
    lua_settop(state, 1);
    match ctype_id(state) {
        Ok(id) => {
            lua_pushnumber(state, f64::from(id.get()));
            1
        }
        Err(err) => raise(state, err),
    }
}

/// `int64(s)` -> `int64_t` cdata parsed from a decimal string
unsafe extern "C-unwind" fn lua_int64(state: *mut lua_State) -> c_int {
    let Some(value) = check_integer::<i64>(state) else {
        luaL_argerror(state, 1, c"decimal int64 expected".as_ptr());
        return 0;
    };
    lua_settop(state, 0);
    match push_cdata_int64(state, value) {
        Ok(()) => 1,
        Err(err) => raise(state, err),
    }
}

/// `uint64(s)` -> `uint64_t` cdata parsed from a decimal string
unsafe extern "C-unwind" fn lua_uint64(state: *mut lua_State) -> c_int {
    let Some(value) = check_integer::<u64>(state) else {
        luaL_argerror(state, 1, c"decimal uint64 expected".as_ptr());
        return 0;
    };
    lua_settop(state, 0);
    match push_cdata_uint64(state, value) {
        Ok(()) => 1,
        Err(err) => raise(state, err),
    }
}

/// Parse argument 1 as a decimal integer
///
/// Raises through `luaL_checklstring` when the argument is not a string or
/// number at all.
unsafe fn check_integer<T: FromStr>(state: *mut lua_State) -> Option<T> {
    let mut len = 0usize;
    let ptr = luaL_checklstring(state, 1, &mut len);
    let bytes = std::slice::from_raw_parts(ptr.cast::<u8>(), len);
    std::str::from_utf8(bytes).ok()?.trim().parse().ok()
}

/// Raise `err` as a Lua error
///
/// Everything Rust owns is dropped before control leaves through
/// `lua_error`.
unsafe fn raise(state: *mut lua_State, err: BridgeError) -> ! {
    let message = err.to_string();
    drop(err);
    lua_pushlstring(state, message.as_ptr().cast(), message.len());
    drop(message);
    lua_error(state)
}
