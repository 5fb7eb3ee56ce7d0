use clap::Subcommand;
use std::path::{Path, PathBuf};

use tether_core::Config;

// ── CLI Schema ──

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Load and validate a config file
    Check {
        /// Path to tether.yaml (defaults to $TETHER_CONFIG)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the built-in default config as YAML
    Show,
}

// ── Dispatch ──

pub fn run(cmd: ConfigCmd) -> anyhow::Result<()> {
    match cmd {
        ConfigCmd::Check { config } => check(config.as_deref()),
        ConfigCmd::Show => show(),
    }
}

// ── Command Implementations ──

fn check(path: Option<&Path>) -> anyhow::Result<()> {
    let config = crate::cmd_hook::resolve_config(path)?;
    print!("{}", render(&config)?);
    eprintln!("config ok");
    Ok(())
}

fn show() -> anyhow::Result<()> {
    print!("{}", render(&Config::default())?);
    Ok(())
}

fn render(config: &Config) -> anyhow::Result<String> {
    Ok(serde_yaml::to_string(config)?)
}
