pub mod capture;

pub use capture::{read_bounded, CaptureError, CapturedOutput};

use std::io::{self, Read};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus};

use crate::config::{CAPTURE_CAP, CAPTURE_INITIAL, REBUILD_ARGS, REBUILD_PROGRAM};
use crate::edit::TargetFile;
use crate::error::DnaError;

/// Program and arguments run after a successful edit. No shell involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl RebuildCommand {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// `nixos-rebuild switch --show-trace`
    pub fn nixos() -> Self {
        Self::new(REBUILD_PROGRAM, REBUILD_ARGS)
    }

    pub fn display(&self) -> String {
        let mut s = self.program.clone();
        for arg in &self.args {
            s.push(' ');
            s.push_str(arg);
        }
        s
    }
}

impl Default for RebuildCommand {
    fn default() -> Self {
        Self::nixos()
    }
}

/// Starts rebuild processes.
pub trait Launcher {
    /// Start `command`. With `capture`, stdout and stderr are merged onto one
    /// stream available from [`RunningRebuild::take_output`]; otherwise the
    /// child inherits the terminal.
    fn launch(
        &self,
        command: &RebuildCommand,
        capture: bool,
    ) -> Result<Box<dyn RunningRebuild>, DnaError>;
}

pub trait RunningRebuild {
    /// The merged output stream, once. `None` when not capturing.
    fn take_output(&mut self) -> Option<Box<dyn Read>>;

    /// Block until the process exits and return its exit code.
    fn wait(&mut self) -> io::Result<i32>;
}

/// Spawns real processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

struct SystemRebuild {
    child: Child,
    output: Option<io::PipeReader>,
}

impl Launcher for SystemLauncher {
    fn launch(
        &self,
        command: &RebuildCommand,
        capture: bool,
    ) -> Result<Box<dyn RunningRebuild>, DnaError> {
        let launch_err = |source: io::Error| DnaError::Launch {
            program: command.program.clone(),
            source,
        };

        let mut cmd = Command::new(resolve_program(&command.program));
        cmd.args(&command.args);

        let output = if capture {
            let (reader, writer) = io::pipe().map_err(launch_err)?;
            cmd.stdout(writer.try_clone().map_err(launch_err)?);
            cmd.stderr(writer);
            Some(reader)
        } else {
            None
        };

        let child = cmd.spawn().map_err(launch_err)?;
        // The command still owns our copies of the pipe's write end; the
        // reader only sees end of stream once they are closed.
        drop(cmd);

        log::debug!("Started {} (pid {})", command.display(), child.id());
        Ok(Box::new(SystemRebuild { child, output }))
    }
}

impl RunningRebuild for SystemRebuild {
    fn take_output(&mut self) -> Option<Box<dyn Read>> {
        self.output
            .take()
            .map(|reader| Box::new(reader) as Box<dyn Read>)
    }

    fn wait(&mut self) -> io::Result<i32> {
        // Drop an unread pipe so a chatty child cannot block on it.
        self.output = None;
        self.child.wait().map(exit_code)
    }
}

/// Resolve a program name to its full path, falling back to the bare name.
fn resolve_program(name: &str) -> PathBuf {
    which::which(name).unwrap_or_else(|_| name.into())
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

/// What happened to the rebuild's output.
#[derive(Debug)]
pub enum Capture {
    /// Output went straight to the terminal.
    Inherited,
    Captured(CapturedOutput),
    /// The output stream could not be read at all.
    Lost(io::Error),
}

impl Capture {
    pub fn output(&self) -> Option<&CapturedOutput> {
        match self {
            Capture::Captured(output) => Some(output),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub enum RebuildOutcome {
    Succeeded { capture: Capture },
    /// The rebuild failed and the config edit was reverted.
    RolledBack { code: i32, capture: Capture },
    /// The rebuild failed and reverting the edit failed too. The config still
    /// holds the edit, or the state `error` describes.
    RollbackFailed {
        code: i32,
        capture: Capture,
        error: DnaError,
    },
}

impl RebuildOutcome {
    pub fn code(&self) -> i32 {
        match self {
            RebuildOutcome::Succeeded { .. } => 0,
            RebuildOutcome::RolledBack { code, .. }
            | RebuildOutcome::RollbackFailed { code, .. } => *code,
        }
    }

    pub fn capture(&self) -> &Capture {
        match self {
            RebuildOutcome::Succeeded { capture }
            | RebuildOutcome::RolledBack { capture, .. }
            | RebuildOutcome::RollbackFailed { capture, .. } => capture,
        }
    }

    pub fn failed(&self) -> bool {
        !matches!(self, RebuildOutcome::Succeeded { .. })
    }
}

/// Run the rebuild against the freshly installed config and revert the edit
/// if it fails.
///
/// Captured output is drained to end of stream before the exit status is
/// read. Past the cap the rest is discarded rather than left in the pipe.
pub fn run(
    target: &TargetFile,
    launcher: &dyn Launcher,
    command: &RebuildCommand,
    quiet: bool,
) -> Result<RebuildOutcome, DnaError> {
    let mut process = launcher.launch(command, quiet)?;

    let capture = match process.take_output() {
        Some(mut stream) => drain(&mut *stream, CAPTURE_INITIAL, CAPTURE_CAP),
        None => Capture::Inherited,
    };

    let code = process.wait().map_err(|source| DnaError::Wait {
        program: command.program.clone(),
        source,
    })?;

    if code == 0 {
        log::info!("{} succeeded", command.display());
        return Ok(RebuildOutcome::Succeeded { capture });
    }

    log::info!(
        "{} exited with {}, reverting {}",
        command.display(),
        code,
        target.original.display()
    );
    match target.swap() {
        Ok(()) => Ok(RebuildOutcome::RolledBack { code, capture }),
        Err(error) => {
            log::error!("Reverting {} failed: {}", target.original.display(), error);
            Ok(RebuildOutcome::RollbackFailed {
                code,
                capture,
                error,
            })
        }
    }
}

/// Read the merged output into a buffer of at most `cap` bytes, then throw
/// away whatever is left so the child never blocks on a full pipe.
fn drain(stream: &mut dyn Read, initial: usize, cap: usize) -> Capture {
    match read_bounded(stream, initial, cap) {
        Ok(output) => {
            if output.truncated {
                log::warn!("Rebuild output exceeded {} bytes", cap);
                if let Err(e) = io::copy(stream, &mut io::sink()) {
                    log::warn!("Failed to discard remaining output: {}", e);
                }
            }
            Capture::Captured(output)
        }
        Err(CaptureError::Unreadable(e)) => Capture::Lost(e),
    }
}
