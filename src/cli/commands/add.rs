use super::Cli;
use crate::cli::{Output, Progress};
use crate::config::{self, ConfigSource, Preferences, DEFAULT_CONFIG, MARKER};
use crate::edit::{self, TargetFile};
use crate::rebuild::{self, Capture, Launcher, RebuildCommand, RebuildOutcome};
use anyhow::Result;
use std::path::PathBuf;
use std::process::ExitCode;

pub fn run(cli: &Cli, launcher: &dyn Launcher) -> Result<ExitCode> {
    let path = config_path(cli)?;
    let target = TargetFile::resolve(&path)?;

    let found = edit::apply_edit(&target, &cli.packages, MARKER)?;
    log::debug!(
        "Inserted {} package(s) at line {}",
        found.inserted,
        found.line
    );
    Output::success(&format!("Successfully edited {}", target.original.display()));

    if cli.text_only {
        return Ok(ExitCode::SUCCESS);
    }

    let command = RebuildCommand::nixos();
    let spinner = cli
        .quiet
        .then(|| Progress::spinner(&format!("Running {}", command.display())));

    let outcome = match rebuild::run(&target, launcher, &command, cli.quiet) {
        Ok(outcome) => outcome,
        Err(e) => {
            if let Some(pb) = &spinner {
                Progress::finish_error(pb, &format!("{} did not run", command.display()));
            }
            return Err(e.into());
        }
    };

    if let Some(pb) = &spinner {
        match &outcome {
            RebuildOutcome::Succeeded { .. } => {
                Progress::finish_success(pb, &format!("{} finished", command.display()))
            }
            RebuildOutcome::RolledBack { code, .. }
            | RebuildOutcome::RollbackFailed { code, .. } => Progress::finish_error(
                pb,
                &format!("{} exited with status {}", command.display(), code),
            ),
        }
    }

    report_capture(&command, &outcome);

    match outcome {
        RebuildOutcome::Succeeded { .. } => {
            Output::success("Done.");
            Ok(ExitCode::SUCCESS)
        }
        RebuildOutcome::RolledBack { code, .. } => {
            Output::error(&format!(
                "{} failed. {} has been reverted",
                command.program,
                target.original.display()
            ));
            Output::info(&format!(
                "The attempted edit is kept in {}",
                target.backup.display()
            ));
            Ok(exit_status(code))
        }
        RebuildOutcome::RollbackFailed { code, error, .. } => {
            Output::error(&format!(
                "{} failed and {} could not be reverted: {:#}",
                command.program,
                target.original.display(),
                anyhow::Error::from(error)
            ));
            Ok(exit_status(code))
        }
    }
}

fn exit_status(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

fn config_path(cli: &Cli) -> Result<PathBuf> {
    let (path, source) =
        config::resolve_config_path(cli.config.as_deref(), Preferences::from_home)?;
    if source == ConfigSource::BuiltIn {
        Output::info("You haven't set a location for your config yet. Use -C");
        Output::info(&format!("Defaulting to: {}", DEFAULT_CONFIG));
    }
    Ok(path)
}

/// Warn about incomplete output, and show it when the rebuild failed.
fn report_capture(command: &RebuildCommand, outcome: &RebuildOutcome) {
    match outcome.capture() {
        Capture::Inherited => {}
        Capture::Lost(e) => {
            log::warn!("Output stream of {} unusable: {}", command.program, e);
            Output::warning(&format!("Lost output from {}", command.display()));
        }
        Capture::Captured(output) => {
            if !output.is_complete() {
                Output::warning(&format!("Lost some output from {}", command.display()));
            }
            if outcome.failed() && !output.is_empty() {
                Output::captured(&command.display(), &output.as_text());
            }
        }
    }
}
