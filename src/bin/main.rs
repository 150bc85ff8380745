//! ctypeid CLI
//!
//! Pushes 64-bit cdata into a fresh LuaJIT state and reports FFI type ids.
//! Handy for checking what a host will see before wiring the bridge in.

use luajit_ctypeid::cli;

fn main() {
    if let Err(e) = cli::run_cli() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
