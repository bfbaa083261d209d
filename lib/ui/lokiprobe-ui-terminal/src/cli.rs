use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "lokiprobe", about = "Roll Loki config variants and load-test the query path")]
pub struct Cli {
    /// Run configuration file.
    #[arg(long, global = true, env = "LOKIPROBE_CONFIG_PATH")]
    pub config: Option<PathBuf>,

    /// Raise log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Print reports to stdout in this format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Patch, restart, wait and query for each variant.
    Run {
        /// Only run the named variants, in configuration order.
        #[arg(long = "variant")]
        variants: Vec<String>,
    },
    /// Merge a fragment into the configured ConfigMap document.
    Patch {
        #[arg(long)]
        fragment: PathBuf,
    },
    /// Restart every configured process group and wait for readiness.
    Restart,
    /// Wait for configured process groups without restarting them.
    Wait {
        /// Only wait on groups with this name.
        #[arg(long)]
        group: Option<String>,
        /// Override the configured timeout.
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
}

/// Flag or env first, then `~/.lokiprobe/config.yaml`, then the working directory.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    if let Ok(home) = std::env::var("HOME") {
        return Path::new(&home).join(".lokiprobe").join("config.yaml");
    }

    PathBuf::from("lokiprobe-config.yaml")
}
