//! Host configuration
//!
//! Sources, lowest to highest priority:
//! 1. Built-in defaults
//! 2. TOML file (`--config`, `CTYPEID_CONFIG_PATH`, or `./ctypeid.toml` if present)
//! 3. `CTYPEID_*` environment variables (a `.env` file is loaded first)
//! 4. Explicit builder overrides (CLI flags)
//!
//! ```toml
//! jit = true
//! log_filter = "info"
//! bridge_global = "ctypeid"
//! ```

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const ENV_PREFIX: &str = "CTYPEID";
pub const CONFIG_PATH_ENV: &str = "CTYPEID_CONFIG_PATH";
pub const DEFAULT_CONFIG_FILE: &str = "ctypeid.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Run the JIT compiler (off means interpreter only)
    pub jit: bool,

    /// Fallback tracing filter when `RUST_LOG` is unset
    pub log_filter: String,

    /// Global name the bridge table is installed under
    pub bridge_global: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            jit: true,
            log_filter: "info".to_string(),
            bridge_global: "ctypeid".to_string(),
        }
    }
}

impl Config {
    /// Load from the default sources
    pub fn load() -> Result<Self> {
        Self::builder().build()
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject values the host cannot apply
    pub fn validate(&self) -> Result<()> {
        if !is_lua_identifier(&self.bridge_global) {
            bail!(
                "bridge_global must be a Lua identifier, got {:?}",
                self.bridge_global
            );
        }
        if self.log_filter.trim().is_empty() {
            bail!("log_filter must not be empty");
        }
        Ok(())
    }
}

/* ===================== Builder ===================== */

#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config_path: Option<PathBuf>,
    jit: Option<bool>,
    load_dotenv: bool,
}

impl ConfigBuilder {
    /// Read this TOML file instead of searching (the file must exist)
    pub fn config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    /// Force the JIT mode regardless of file and environment
    pub fn jit(mut self, jit: Option<bool>) -> Self {
        self.jit = jit;
        self
    }

    /// Load `.env` from the working directory before reading the environment
    pub fn dotenv(mut self, enabled: bool) -> Self {
        self.load_dotenv = enabled;
        self
    }

    pub fn build(self) -> Result<Config> {
        if self.load_dotenv {
            let _ = dotenvy::dotenv();
        }

        let defaults = Config::default();
        let mut builder = config::Config::builder()
            .set_default("jit", defaults.jit)?
            .set_default("log_filter", defaults.log_filter)?
            .set_default("bridge_global", defaults.bridge_global)?;

        let explicit = self
            .config_path
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from));
        builder = match explicit {
            Some(path) => {
                if !path.is_file() {
                    bail!("Config file not found: {}", path.display());
                }
                builder.add_source(config::File::from(path).required(true))
            }
            None => builder.add_source(config::File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .ignore_empty(true),
            )
            .set_override_option("jit", self.jit)?
            .build()
            .context("Failed to read configuration sources")?;

        let config: Config = settings
            .try_deserialize()
            .context("Invalid configuration")?;
        config.validate()?;
        Ok(config)
    }
}

fn is_lua_identifier(name: &str) -> bool {
    const KEYWORDS: [&str; 22] = [
        "and", "break", "do", "else", "elseif", "end", "false", "for", "function", "goto", "if",
        "in", "local", "nil", "not", "or", "repeat", "return", "then", "true", "until", "while",
    ];
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !KEYWORDS.contains(&name)
}
