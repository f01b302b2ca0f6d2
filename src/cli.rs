use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;
use crate::config::Config;

/// Recurring compliance task CLI.
/// Settings come from ~/.ctask/config.toml or a path passed via --config.
#[derive(Parser)]
#[command(name = "ctask", version, about = "Create recurring compliance task chains")]
pub struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long, global = true, env = "CTASK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Base URL of the task service.
    #[arg(long, global = true, env = "CTASK_API_URL")]
    pub api_url: Option<String>,

    /// Bearer token sent with every request.
    #[arg(long, global = true, env = "CTASK_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Override file settings with flags and environment variables.
    pub fn apply(&self, config: &mut Config) {
        if let Some(url) = &self.api_url {
            config.api_url = url.clone();
        }
        if let Some(token) = &self.token {
            config.token = Some(token.clone());
        }
        if let Some(secs) = self.timeout {
            config.timeout_secs = secs;
        }
    }
}
