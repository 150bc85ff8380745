//! Tests for the Lua-callable bridge table

use super::helpers::{eval_display, new_host, remove_ffi};

#[test]
fn test_typeid_from_lua() {
    let mut host = new_host();

    assert_eq!(eval_display(&mut host, "ctypeid.typeid(5)"), "0");
    assert_eq!(eval_display(&mut host, "ctypeid.typeid()"), "0");
    assert_eq!(eval_display(&mut host, "ctypeid.typeid(ctypeid.int64('1'))"), "11");
    assert_eq!(eval_display(&mut host, "ctypeid.typeid(ctypeid.uint64('1'))"), "12");
    assert_eq!(
        eval_display(
            &mut host,
            "ctypeid.typeid(ctypeid.int64('-1')) == ctypeid.typeid(require('ffi').new('int64_t'))"
        ),
        "true"
    );
    assert_eq!(host.top(), 0);
}

#[test]
fn test_typeid_ignores_extra_arguments() {
    let mut host = new_host();

    assert_eq!(
        eval_display(&mut host, "ctypeid.typeid(ctypeid.int64('1'), 'extra', 3)"),
        "11"
    );
}

#[test]
fn test_int64_and_uint64_from_strings() {
    let mut host = new_host();

    assert_eq!(
        eval_display(&mut host, "ctypeid.int64('-9223372036854775808')"),
        "-9223372036854775808LL"
    );
    assert_eq!(
        eval_display(&mut host, "ctypeid.uint64(' 18446744073709551615 ')"),
        "18446744073709551615ULL"
    );
    // Numbers are accepted through their string form.
    assert_eq!(eval_display(&mut host, "ctypeid.int64(42)"), "42LL");
}

#[test]
fn test_bad_arguments_raise_lua_errors() {
    let mut host = new_host();

    let cases = [
        ("ctypeid.int64, 'abc'", "decimal int64 expected"),
        ("ctypeid.int64, '9223372036854775808'", "decimal int64 expected"),
        ("ctypeid.uint64, '-1'", "decimal uint64 expected"),
        ("ctypeid.int64, {}", "string expected"),
    ];
    for (call, expected) in cases {
        host.exec(&format!(
            "local ok, err = pcall({call})
             assert(not ok, 'call should fail')
             assert(err:find('{expected}', 1, true), err)"
        ))
        .unwrap_or_else(|e| panic!("{call}: {e:#}"));
    }
    assert_eq!(host.top(), 0);
}

#[test]
fn test_bridge_failures_reach_lua_error_channel() {
    let mut host = new_host();
    remove_ffi(&mut host);

    host.exec(
        "local ok, err = pcall(ctypeid.typeid, 1)
         assert(not ok)
         assert(err:find('could not resolve ffi.typeof', 1, true), err)",
    )
    .unwrap();

    let err = host.eval("ctypeid.typeid(1)").unwrap_err();
    assert!(format!("{err:#}").contains("could not resolve ffi.typeof"));
    assert_eq!(host.top(), 0);
}

#[test]
fn test_lua_api_under_repeated_use() {
    let mut host = new_host();

    host.exec(
        "local seen = {}
         for i = 1, 1000 do
           local v = (i % 2 == 0) and ctypeid.int64(tostring(-i)) or ctypeid.uint64(tostring(i))
           seen[ctypeid.typeid(v)] = true
         end
         local n = 0
         for _ in pairs(seen) do n = n + 1 end
         assert(n == 2, 'expected exactly two distinct ids')",
    )
    .unwrap();
    assert_eq!(host.top(), 0);
}
