//! Querying the FFI type id of a value
//!
//! The id comes from `ffi.typeof(subject)`. On success that call returns a
//! ctype object: a cdata whose own type is `CTID_CTYPEID` and whose 32-bit
//! payload is the id of the subject's type.

use super::errors::BridgeError;
use super::stack::{load_and_call, pcall, type_name, Failure, StackGuard};
use mlua_sys::{lua_State, lua_gettop, lua_isfunction, lua_pushvalue, lua_topointer, lua_type, LUA_TCDATA};
use serde::{Deserialize, Serialize};
use std::ffi::{c_int, CStr};
use std::fmt;
use tracing::debug;

const TYPEOF_SNIPPET: &str = "return require('ffi').typeof";
const CHUNK_NAME: &CStr = c"=ctypeid.typeof";

/* ===================== Type Id ===================== */

/// A LuaJIT `CTypeID`
///
/// Ids are stable for the lifetime of one interpreter state. Zero is never
/// a real id and marks a value without a foreign type.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CTypeId(pub u32);

impl CTypeId {
    /// Sentinel for "not a foreign type"
    pub const NONE: CTypeId = CTypeId(0);

    // Fixed slots in the vendored LuaJIT 2.1 builtin type table (lj_ctype.h).
    pub const INT64: CTypeId = CTypeId(11);
    pub const UINT64: CTypeId = CTypeId(12);
    pub const CTYPEID: CTypeId = CTypeId(22);

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    /// `None` for the sentinel, `Some(self)` for a real id
    pub fn known(self) -> Option<CTypeId> {
        if self.is_none() {
            None
        } else {
            Some(self)
        }
    }
}

impl From<CTypeId> for u32 {
    fn from(id: CTypeId) -> u32 {
        id.0
    }
}

impl fmt::Display for CTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/* ===================== Query ===================== */

/// FFI type id of the value on top of the stack
///
/// Returns [`CTypeId::NONE`] when `ffi.typeof` rejects the subject (a plain
/// number, a string that is not a C declaration, a table...). Every other
/// failure is an error. The stack is at its entry height on return either
/// way; the subject itself is left in place.
///
/// # Safety
/// `state` must be a valid LuaJIT state with FFI support, used by no one
/// else for the duration of the call.
pub unsafe fn ctype_id(state: *mut lua_State) -> Result<CTypeId, BridgeError> {
    let guard = StackGuard::new(state);
    let subject = guard.entry_top();
    if subject == 0 {
        return Err(BridgeError::EmptyStack);
    }

    load_and_call(state, TYPEOF_SNIPPET, CHUNK_NAME, 1).map_err(|failure| match failure {
        Failure::Load(message) | Failure::Call(message) => BridgeError::Resolve { message },
    })?;

    if lua_isfunction(state, -1) == 0 {
        return Err(BridgeError::NotCallable {
            top: lua_gettop(state),
        });
    }

    lua_pushvalue(state, subject);
    if let Err(message) = pcall(state, 1, 1) {
        // e.g. "bad argument #1 to 'typeof' (C type expected, got number)"
        debug!(%message, "subject has no foreign type");
        return Ok(CTypeId::NONE);
    }

    if lua_type(state, -1) != LUA_TCDATA {
        return Err(BridgeError::UnexpectedResult {
            found: type_name(state, -1),
        });
    }
    match cdata_type_tag(state, -1) {
        Some(tag) if tag == CTypeId::CTYPEID => {}
        Some(tag) => {
            return Err(BridgeError::UnexpectedResult {
                found: format!("cdata with type id {tag}"),
            })
        }
        None => {
            return Err(BridgeError::UnexpectedResult {
                found: "cdata without payload".to_string(),
            })
        }
    }

    let payload = lua_topointer(state, -1).cast::<u32>();
    Ok(CTypeId(payload.read_unaligned()))
}

/* ===================== Cdata Header ===================== */

// Distance from a cdata payload back to the `ctypeid` field of its GCcdata
// header: { GCRef nextgc; u8 marked; u8 gct; u16 ctypeid }. GCRef is 64-bit
// under LJ_GC64 and 32-bit otherwise. The vendored LuaJIT enables GC64 on
// every 64-bit target it supports and the build never passes
// LUAJIT_DISABLE_GC64, so pointer width stands in for the GC64 switch.
// Linking a 64-bit non-GC64 LuaJIT would break this.
#[cfg(target_pointer_width = "64")]
const CTYPEID_FIELD_BACK: usize = 6;
#[cfg(not(target_pointer_width = "64"))]
const CTYPEID_FIELD_BACK: usize = 2;

/// Type id stored in the header of the cdata at `idx`
///
/// `None` if the value is not cdata.
///
/// # Safety
/// `state` must be a valid LuaJIT state and `idx` an acceptable index.
pub unsafe fn cdata_type_tag(state: *mut lua_State, idx: c_int) -> Option<CTypeId> {
    if lua_type(state, idx) != LUA_TCDATA {
        return None;
    }
    let payload = lua_topointer(state, idx).cast::<u8>();
    if payload.is_null() {
        return None;
    }
    let field = payload.sub(CTYPEID_FIELD_BACK).cast::<u16>();
    Some(CTypeId(u32::from(field.read_unaligned())))
}
