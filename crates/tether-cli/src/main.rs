mod cmd_config;
mod cmd_cookies;
mod cmd_hook;
mod logging;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "tether",
    version,
    about = "Session and resource correlation hooks for HTTP load tests"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one hook (reads the hook envelope JSON from stdin)
    Hook {
        /// Path to tether.yaml (defaults to $TETHER_CONFIG, then built-in defaults)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Parse Set-Cookie values and print the name → value map as JSON
    Cookies {
        /// Raw Set-Cookie header values
        values: Vec<String>,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        cmd: cmd_config::ConfigCmd,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init()?;

    match cli.cmd {
        Command::Hook { config } => cmd_hook::execute(config.as_deref()),
        Command::Cookies { values } => cmd_cookies::execute(&values),
        Command::Config { cmd } => cmd_config::run(cmd),
    }
}
