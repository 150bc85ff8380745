//! Bridge error type
//!
//! Every variant is an infrastructure failure. A subject without a foreign
//! type is not an error; it yields [`CTypeId::NONE`](super::CTypeId::NONE).

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// The generated snippet did not compile
    #[error("{op} error: could not load snippet `{snippet}`: {message}")]
    Load {
        op: &'static str,
        snippet: String,
        message: String,
    },

    /// The compiled snippet raised while running
    #[error("{op} error: pcall to load cdata onto stack failed: {message}")]
    Call { op: &'static str, message: String },

    /// `ctype_id` was called with nothing on the stack to inspect
    #[error("ctype_id error: no subject value on the stack")]
    EmptyStack,

    /// `require('ffi').typeof` could not be loaded or run
    #[error("ctype_id error: could not resolve ffi.typeof: {message}")]
    Resolve { message: String },

    /// The resolved introspection value was not a function
    #[error("ctype_id error: ffi.typeof is not a function at top of stack; new_top={top}")]
    NotCallable { top: i32 },

    /// `ffi.typeof` returned something other than a ctype object
    #[error("ctype_id error: ffi.typeof returned {found}, expected a ctype object")]
    UnexpectedResult { found: String },
}
