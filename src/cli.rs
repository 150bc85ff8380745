use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use crate::bridge::CTypeId;
use crate::config::Config;
use crate::host::LuaHost;
use crate::logging::init_tracing;

#[derive(Parser, Debug)]
#[command(name = "ctypeid")]
#[command(about = "Push 64-bit cdata into LuaJIT and query FFI type ids", long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default search)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run LuaJIT with the JIT compiler disabled
    #[arg(long, global = true)]
    pub no_jit: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Push a signed 64-bit integer as int64_t cdata
    Int64 {
        #[arg(allow_negative_numbers = true)]
        value: i64,
    },

    /// Push an unsigned 64-bit integer as uint64_t cdata
    Uint64 { value: u64 },

    /// Evaluate a Lua expression and report its FFI type id (0 if none)
    Typeof {
        /// Lua expression, e.g. "require('ffi').new('int[4]')"
        expr: String,
    },

    /// Print the effective configuration as TOML
    Config,
}

/// Outcome of one bridge command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    /// `tostring` of the value that was inspected
    pub value: String,
    /// Its type id, 0 when it has no foreign type
    pub ctype_id: CTypeId,
}

/// Run the CLI by parsing process arguments
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    run_cli_with_args(cli)
}

/// Run the CLI with provided arguments
pub fn run_cli_from_args(args: Vec<String>) -> Result<()> {
    let cli = Cli::parse_from(args);
    run_cli_with_args(cli)
}

fn run_cli_with_args(cli: Cli) -> Result<()> {
    let config = Config::builder()
        .config_path(cli.config.map(PathBuf::from))
        .jit(cli.no_jit.then_some(false))
        .dotenv(true)
        .build()?;

    init_tracing(&config.log_filter);

    if cli.command == Commands::Config {
        print!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let mut host = LuaHost::from_config(&config)?;
    let report = execute(&cli.command, &mut host)?;

    if cli.json {
        println!("{}", serde_json::to_string(&report)?);
    } else {
        println!("Value: {}", report.value);
        match report.ctype_id.known() {
            Some(id) => println!("CTypeID: {}", id),
            None => println!("CTypeID: 0 (not a foreign type)"),
        }
    }
    Ok(())
}

/// Run one bridge command against `host`
///
/// The host stack is back at its starting height afterwards.
pub fn execute(command: &Commands, host: &mut LuaHost) -> Result<Report> {
    match command {
        Commands::Int64 { value } => {
            host.push_int64(*value)?;
        }
        Commands::Uint64 { value } => {
            host.push_uint64(*value)?;
        }
        Commands::Typeof { expr } => {
            host.eval(expr)
                .with_context(|| format!("Failed to evaluate `{expr}`"))?;
        }
        Commands::Config => anyhow::bail!("config does not run against an interpreter"),
    }

    let inspected = describe_top(host);
    host.pop(1);
    inspected
}

fn describe_top(host: &mut LuaHost) -> Result<Report> {
    let ctype_id = host.ctype_id()?;
    let value = host.to_display(-1)?;
    Ok(Report { value, ctype_id })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host() -> LuaHost {
        LuaHost::from_config(&Config::default()).unwrap()
    }

    #[test]
    fn test_parse_negative_int64() {
        let cli = Cli::try_parse_from(["ctypeid", "int64", "-9223372036854775808"]).unwrap();
        assert_eq!(cli.command, Commands::Int64 { value: i64::MIN });
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["ctypeid", "uint64", "7", "--json", "--no-jit"]).unwrap();
        assert!(cli.json);
        assert!(cli.no_jit);
        assert_eq!(cli.command, Commands::Uint64 { value: 7 });
    }

    #[test]
    fn test_parse_rejects_out_of_range() {
        assert!(Cli::try_parse_from(["ctypeid", "uint64", "-1"]).is_err());
        assert!(Cli::try_parse_from(["ctypeid", "int64", "9223372036854775808"]).is_err());
    }

    #[test]
    fn test_execute_int64() {
        let mut host = host();
        let report = execute(&Commands::Int64 { value: -5 }, &mut host).unwrap();
        assert_eq!(report.value, "-5LL");
        assert_eq!(report.ctype_id, CTypeId::INT64);
        assert_eq!(host.top(), 0);
    }

    #[test]
    fn test_execute_uint64_max() {
        let mut host = host();
        let report = execute(&Commands::Uint64 { value: u64::MAX }, &mut host).unwrap();
        assert_eq!(report.value, "18446744073709551615ULL");
        assert_eq!(report.ctype_id, CTypeId::UINT64);
    }

    #[test]
    fn test_execute_typeof_plain_number() {
        let mut host = host();
        let command = Commands::Typeof {
            expr: "5".to_string(),
        };
        let report = execute(&command, &mut host).unwrap();
        assert_eq!(report.value, "5");
        assert_eq!(report.ctype_id, CTypeId::NONE);
        assert_eq!(host.top(), 0);
    }

    #[test]
    fn test_execute_typeof_bad_expression() {
        let mut host = host();
        let command = Commands::Typeof {
            expr: "(".to_string(),
        };
        let err = execute(&command, &mut host).unwrap_err();
        assert!(err.to_string().contains("Failed to evaluate"));
        assert_eq!(host.top(), 0);
    }

    #[test]
    fn test_report_json_shape() {
        let report = Report {
            value: "1LL".to_string(),
            ctype_id: CTypeId::INT64,
        };
        assert_eq!(
            serde_json::to_string(&report).unwrap(),
            r#"{"value":"1LL","ctype_id":11}"#
        );
    }
}
