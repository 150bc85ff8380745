//! Owned LuaJIT state for hosts and tests
//!
//! The bridge operates on a borrowed `lua_State`; `LuaHost` is the piece
//! that actually owns one. It opens the standard libraries (including `ffi`
//! and `jit`), applies configuration, and closes the state on drop.

use anyhow::{anyhow, bail, Context, Result};
use mlua_sys::{
    lua_State, lua_close, lua_getglobal, lua_gettop, lua_pushvalue, lua_setglobal, lua_settop,
    luaL_newstate, luaL_openlibs,
};
use std::ffi::{c_int, CString};
use std::ptr::NonNull;
use tracing::{debug, info};

use crate::bridge::stack::{load_and_call, pcall, string_at, type_name, Failure, StackGuard};
use crate::bridge::{self, lua_api, BridgeError, CTypeId};
use crate::config::Config;

/// An interpreter state owned by the host
///
/// Single-threaded: the raw state is neither `Send` nor `Sync`.
pub struct LuaHost {
    state: NonNull<lua_State>,
}

impl LuaHost {
    /// Create a state with the standard libraries opened
    pub fn new() -> Result<Self> {
        // SAFETY: luaL_newstate has no preconditions.
        let state = NonNull::new(unsafe { luaL_newstate() })
            .ok_or_else(|| anyhow!("Failed to allocate LuaJIT state"))?;
        // SAFETY: freshly created, valid state.
        unsafe { luaL_openlibs(state.as_ptr()) };
        debug!("LuaJIT state created");
        Ok(Self { state })
    }

    /// Create a state and apply `config`: JIT mode and the bridge global
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut host = Self::new()?;
        host.set_jit(config.jit)?;
        host.open_bridge(&config.bridge_global)?;
        info!(jit = config.jit, global = %config.bridge_global, "Host initialized");
        Ok(host)
    }

    /// Raw handle for passing to the bridge
    pub fn as_ptr(&self) -> *mut lua_State {
        self.state.as_ptr()
    }

    /// Current stack height
    pub fn top(&self) -> i32 {
        // SAFETY: `state` is valid for the lifetime of `self`.
        unsafe { lua_gettop(self.as_ptr()) }
    }

    /// Pop `n` values
    pub fn pop(&mut self, n: i32) {
        let n = n.min(self.top());
        // SAFETY: never pops below zero.
        unsafe { lua_settop(self.as_ptr(), -n - 1) };
    }

    /// Run a chunk for its side effects
    pub fn exec(&mut self, source: &str) -> Result<()> {
        self.run(source, 0)
    }

    /// Push the value of one Lua expression
    pub fn eval(&mut self, expr: &str) -> Result<()> {
        self.run(&format!("return {expr}"), 1)
    }

    fn run(&mut self, source: &str, nresults: c_int) -> Result<()> {
        let state = self.as_ptr();
        // SAFETY: `state` is valid and exclusively borrowed through `self`.
        unsafe {
            let guard = StackGuard::new(state);
            match load_and_call(state, source, c"=host", nresults) {
                Ok(()) => {
                    guard.keep(nresults);
                    Ok(())
                }
                Err(Failure::Load(message)) => bail!("Failed to compile chunk: {message}"),
                Err(Failure::Call(message)) => bail!("Chunk raised an error: {message}"),
            }
        }
    }

    /// Switch the JIT compiler on or off
    pub fn set_jit(&mut self, enabled: bool) -> Result<()> {
        let mode = if enabled { "on" } else { "off" };
        self.exec(&format!("require('jit').{mode}()"))
            .with_context(|| format!("Failed to turn JIT {mode}"))?;
        debug!(enabled, "JIT mode set");
        Ok(())
    }

    /// Install the bridge table as global `name`
    pub fn open_bridge(&mut self, name: &str) -> Result<()> {
        let global = CString::new(name).context("Bridge global name contains a NUL byte")?;
        let state = self.as_ptr();
        // SAFETY: `state` is valid; open pushes one table which setglobal pops.
        unsafe {
            lua_api::open(state);
            lua_setglobal(state, global.as_ptr());
        }
        Ok(())
    }

    /// `tostring` of the value at `idx`
    pub fn to_display(&mut self, idx: i32) -> Result<String> {
        let state = self.as_ptr();
        let top = self.top();
        let abs = if idx < 0 { top + idx + 1 } else { idx };
        if abs <= 0 || abs > top {
            bail!("Stack index {idx} is out of range (top={top})");
        }
        // SAFETY: `abs` was checked against the current stack height.
        unsafe {
            let _guard = StackGuard::new(state);
            lua_getglobal(state, c"tostring".as_ptr());
            lua_pushvalue(state, abs);
            pcall(state, 1, 1).map_err(|message| anyhow!("tostring failed: {message}"))?;
            string_at(state, -1).ok_or_else(|| {
                anyhow!("tostring returned a {} value", type_name(state, -1))
            })
        }
    }

    /* ===================== Bridge ===================== */

    /// See [`bridge::push_cdata_int64`]
    pub fn push_int64(&mut self, value: i64) -> Result<(), BridgeError> {
        // SAFETY: `state` is valid and exclusively borrowed through `self`.
        unsafe { bridge::push_cdata_int64(self.as_ptr(), value) }
    }

    /// See [`bridge::push_cdata_uint64`]
    pub fn push_uint64(&mut self, value: u64) -> Result<(), BridgeError> {
        // SAFETY: as above.
        unsafe { bridge::push_cdata_uint64(self.as_ptr(), value) }
    }

    /// See [`bridge::ctype_id`]
    pub fn ctype_id(&mut self) -> Result<CTypeId, BridgeError> {
        // SAFETY: as above.
        unsafe { bridge::ctype_id(self.as_ptr()) }
    }
}

impl Drop for LuaHost {
    fn drop(&mut self) {
        // SAFETY: the state is owned by `self` and closed exactly once.
        unsafe { lua_close(self.as_ptr()) };
        debug!("LuaJIT state closed");
    }
}
