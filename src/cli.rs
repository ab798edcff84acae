//! Command-line interface
//!
//! Flags override every other configuration source.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::ConfigOverrides;

#[derive(Debug, Parser)]
#[command(name = "starzd", version, about = "GitHub login and repository star proxy")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Run(RunArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct RunArgs {
    /// Configuration file (replaces config/local.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Bind address
    #[arg(short = 'n', long)]
    pub host: Option<String>,

    /// Bind port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// GitHub OAuth client id
    #[arg(short = 'i', long)]
    pub client_id: Option<String>,

    /// GitHub OAuth client secret
    #[arg(short = 's', long)]
    pub client_secret: Option<String>,

    /// Session cookie signing secret (32+ bytes)
    #[arg(short = 'c', long)]
    pub cookie_secret: Option<String>,

    /// GitHub API token used for repository listing
    #[arg(short = 'a', long)]
    pub api_token: Option<String>,

    /// Static asset directory
    #[arg(long)]
    pub static_dir: Option<PathBuf>,
}

impl From<RunArgs> for ConfigOverrides {
    fn from(args: RunArgs) -> Self {
        ConfigOverrides {
            config_file: args.config,
            host: args.host,
            port: args.port,
            client_id: args.client_id,
            client_secret: args.client_secret,
            api_token: args.api_token,
            cookie_secret: args.cookie_secret,
            static_dir: args.static_dir,
        }
    }
}
