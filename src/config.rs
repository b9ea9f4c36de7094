use crate::calc::WeightConfig;
use clap::{Parser, ValueEnum};
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AuthMode {
    /// Sign in as a fixed demo teacher or student.
    Demo,
    /// Require the hosted login backend.
    Remote,
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMode::Demo => f.write_str("demo"),
            AuthMode::Remote => f.write_str("remote"),
        }
    }
}

/// Clasfy grade and attendance sidecar. Reads one JSON request per line on
/// stdin and answers one JSON line per request on stdout.
#[derive(Debug, Clone, Parser)]
#[command(name = "clasfyd", version)]
pub struct Config {
    /// Workspace folder to open at startup.
    #[arg(long, env = "CLASFYD_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    #[arg(long, env = "CLASFYD_AUTH_MODE", value_enum, default_value_t = AuthMode::Remote)]
    pub auth_mode: AuthMode,

    /// Default component weights as assignment,midterm,final.
    #[arg(long, env = "CLASFYD_WEIGHTS", default_value = "30,30,40")]
    pub weights: WeightConfig,

    /// Used when RUST_LOG is unset.
    #[arg(long, env = "CLASFYD_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workspace: None,
            auth_mode: AuthMode::Remote,
            weights: WeightConfig::default(),
            log_level: "info".to_string(),
        }
    }
}
