mod add;
mod default;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::rebuild::SystemLauncher;

#[derive(Parser)]
#[command(name = "dna")]
#[command(about = "Add packages to your NixOS configuration and rebuild", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Use this configuration file for this run only
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set the persistent configuration file location
    #[arg(
        short = 'C',
        long = "set-default",
        value_name = "PATH",
        conflicts_with = "packages"
    )]
    pub set_default: Option<PathBuf>,

    /// Text only mode: edit the file but don't run nixos-rebuild
    #[arg(short = 't', long)]
    pub text_only: bool,

    /// Only print nixos-rebuild output if it fails
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Packages to add
    #[arg(value_name = "PKG", required_unless_present = "set_default")]
    pub packages: Vec<String>,
}

impl Cli {
    pub fn run(self) -> Result<ExitCode> {
        if let Some(path) = &self.set_default {
            default::run(path)?;
            return Ok(ExitCode::SUCCESS);
        }

        add::run(&self, &SystemLauncher)
    }
}
