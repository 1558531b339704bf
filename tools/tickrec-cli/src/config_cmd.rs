//! Config command - show or save the effective configuration

use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use tickrec_core::RecorderConfig;

/// Arguments for the config command
#[derive(Args)]
pub struct ConfigArgs {
    /// Config file (defaults to the platform config path)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the effective configuration as TOML
    #[arg(long)]
    pub print: bool,

    /// Write the effective configuration to the config file
    #[arg(long)]
    pub save: bool,
}

/// Execute the config command
pub fn execute(args: ConfigArgs) -> Result<()> {
    let path = args.config.clone().or_else(tickrec_core::config_path);
    let config = load_config(args.config.as_deref())?;

    if args.save {
        let path = path.clone().context("No config path available on this platform")?;
        config.save(&path)?;
        println!("Saved {}", path.display());
    }

    if args.print || !args.save {
        match &path {
            Some(path) => println!("# {}", path.display()),
            None => println!("# (no config file)"),
        }
        print!("{}", render(&config)?);
    }
    Ok(())
}

/// Load an explicit config file strictly, or the platform config leniently.
pub fn load_config(explicit: Option<&Path>) -> Result<RecorderConfig> {
    match explicit {
        Some(path) => RecorderConfig::load(path),
        None => Ok(tickrec_core::config_path()
            .map(|path| RecorderConfig::load_or_default(&path))
            .unwrap_or_default()),
    }
}

fn render(config: &RecorderConfig) -> Result<String> {
    toml::to_string_pretty(config).context("Failed to serialize config")
}
