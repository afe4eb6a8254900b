use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DnaError {
    #[error("Permission denied for {}. (Are you sudo?)", path.display())]
    PermissionDenied { path: PathBuf },

    #[error("Error opening file {}", path.display())]
    Unresolvable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} did not contain {marker}", path.display())]
    MarkerNotFound { path: PathBuf, marker: String },

    #[error("Error with {}", path.display())]
    Staging {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to move {} to {}", from.display(), to.display())]
    Swap {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to launch {program}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed waiting for {program}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Couldn't use {}", path.display())]
    Preference {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Could not find home directory")]
    HomeNotFound,
}

impl DnaError {
    /// Classify a failure to resolve or open the target file.
    pub fn open_failed(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::PermissionDenied {
            Self::PermissionDenied {
                path: path.to_path_buf(),
            }
        } else {
            Self::Unresolvable {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    pub fn swap(from: &Path, to: &Path, source: io::Error) -> Self {
        Self::Swap {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        }
    }
}
