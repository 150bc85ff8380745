//! Test helpers for bridge tests
//!
//! Reading cdata payloads back out and rigging `ffi` to misbehave.

use crate::bridge::ctypeid::cdata_type_tag;
use crate::bridge::CTypeId;
use crate::host::LuaHost;
use mlua_sys::lua_topointer;

/// Fresh state with the standard libraries and the bridge table as `ctypeid`
pub fn new_host() -> LuaHost {
    let mut host = LuaHost::new().expect("Failed to create LuaJIT state");
    host.open_bridge("ctypeid").expect("Failed to open bridge");
    host
}

/// Value of the `int64_t` cdata at `idx`
pub fn read_int64(host: &LuaHost, idx: i32) -> i64 {
    unsafe {
        assert_eq!(cdata_type_tag(host.as_ptr(), idx), Some(CTypeId::INT64));
        lua_topointer(host.as_ptr(), idx).cast::<i64>().read_unaligned()
    }
}

/// Value of the `uint64_t` cdata at `idx`
pub fn read_uint64(host: &LuaHost, idx: i32) -> u64 {
    unsafe {
        assert_eq!(cdata_type_tag(host.as_ptr(), idx), Some(CTypeId::UINT64));
        lua_topointer(host.as_ptr(), idx).cast::<u64>().read_unaligned()
    }
}

/// Evaluate `expr` and return its `tostring`, leaving the stack as it was
pub fn eval_display(host: &mut LuaHost, expr: &str) -> String {
    host.eval(expr).expect("Lua expression failed");
    let shown = host.to_display(-1).expect("tostring failed");
    host.pop(1);
    shown
}

/// Replace what `require('ffi')` returns with the table built by `lua`
///
/// `real` is in scope inside `lua` and refers to the genuine ffi module.
pub fn rig_ffi(host: &mut LuaHost, lua: &str) {
    host.exec(&format!(
        "local real = require('ffi')\npackage.loaded.ffi = {lua}"
    ))
    .expect("Failed to rig ffi");
}

/// Make `require('ffi')` fail outright
pub fn remove_ffi(host: &mut LuaHost) {
    host.exec(
        "package.loaded.ffi = nil
         package.preload.ffi = nil
         package.path = ''
         package.cpath = ''",
    )
    .expect("Failed to remove ffi");
}

/// Deterministic spread of 64-bit values (xorshift64*)
pub fn sample_u64(count: usize) -> Vec<u64> {
    let mut x: u64 = 0x9E37_79B9_7F4A_7C15;
    (0..count)
        .map(|_| {
            x ^= x >> 12;
            x ^= x << 25;
            x ^= x >> 27;
            x.wrapping_mul(0x2545_F491_4F6C_DD1D)
        })
        .collect()
}
