//! Tests for the stack bridge
//!
//! All of these run against a real vendored LuaJIT state.

mod helpers;
mod lua_api_tests;
