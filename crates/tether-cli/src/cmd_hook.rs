use std::io::Read;
use std::path::Path;

use anyhow::Context;
use tether_core::Config;

/// Environment variable naming the config file when `--config` is absent.
pub const CONFIG_ENV: &str = "TETHER_CONFIG";

/// `tether hook`: read stdin, dispatch hook
pub fn execute(config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = resolve_config(config_path)?;

    let mut stdin_buf = String::new();
    std::io::stdin()
        .read_to_string(&mut stdin_buf)
        .context("reading hook envelope from stdin")?;
    tracing::debug!(bytes = stdin_buf.len(), "hook envelope received");

    let result = match tether_bridge::hook_entrypoint_from_stdin(&stdin_buf, &config) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("tether: {e:#}");
            // Exit 1 = abort the step; the engine marks the run failed.
            std::process::exit(1);
        }
    };
    if let Some(output) = &result.stdout {
        print!("{output}");
    }
    if let Some(msg) = &result.stderr {
        eprintln!("{msg}");
        std::process::exit(1);
    }
    Ok(())
}

/// `--config`, then `$TETHER_CONFIG`, then built-in defaults.
pub fn resolve_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    let from_env = std::env::var_os(CONFIG_ENV).map(std::path::PathBuf::from);
    match explicit.map(Path::to_path_buf).or(from_env) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            Ok(tether_core::config::load_config(&path)?)
        }
        None => Ok(Config::default()),
    }
}
