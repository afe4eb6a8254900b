//! Editing the configuration file: marker insertion plus the rename-based
//! swap that installs the result.

pub mod insert;
pub mod swap;

pub use insert::{insert, InsertError, MarkerFound};
pub use swap::swap;

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::{BACKUP_SUFFIX, TEMP_SUFFIX};
use crate::error::DnaError;

/// The config file and the two siblings used to replace it safely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFile {
    pub original: PathBuf,
    pub backup: PathBuf,
    pub temp: PathBuf,
}

impl TargetFile {
    /// Canonicalize `path` and derive the backup and temp paths from it.
    pub fn resolve(path: &Path) -> Result<Self, DnaError> {
        let original = fs::canonicalize(path).map_err(|e| DnaError::open_failed(path, e))?;
        log::debug!("Resolved {} to {}", path.display(), original.display());
        Ok(Self::from_canonical(original))
    }

    pub fn from_canonical(original: PathBuf) -> Self {
        Self {
            backup: with_suffix(&original, BACKUP_SUFFIX),
            temp: with_suffix(&original, TEMP_SUFFIX),
            original,
        }
    }

    /// Install the staged content at the original path, or undo a previous
    /// call. See [`swap`].
    pub fn swap(&self) -> Result<(), DnaError> {
        swap(&self.backup, &self.original, &self.temp)
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Write the edited config into the staging file (the backup path).
///
/// Nothing is installed here. On any failure the staging file is removed
/// and the original is left untouched.
pub fn stage<S: AsRef<str>>(
    target: &TargetFile,
    items: &[S],
    marker: &str,
) -> Result<MarkerFound, DnaError> {
    let source =
        File::open(&target.original).map_err(|e| DnaError::open_failed(&target.original, e))?;

    let result = write_staged(target, items, marker, source);
    if result.is_err() {
        if let Err(e) = fs::remove_file(&target.backup) {
            if e.kind() != io::ErrorKind::NotFound {
                log::warn!("Failed to remove {}: {}", target.backup.display(), e);
            }
        }
    }
    result
}

fn write_staged<S: AsRef<str>>(
    target: &TargetFile,
    items: &[S],
    marker: &str,
    source: File,
) -> Result<MarkerFound, DnaError> {
    let staging_err = |source: io::Error| DnaError::Staging {
        path: target.backup.clone(),
        source,
    };

    let permissions = source.metadata().map_err(staging_err)?.permissions();
    let staged = File::create(&target.backup).map_err(staging_err)?;
    staged.set_permissions(permissions).map_err(staging_err)?;

    let mut sink = BufWriter::new(staged);
    let found = match insert(items, BufReader::new(source), &mut sink, marker) {
        Ok(found) => found,
        Err(InsertError::MarkerNotFound) => {
            return Err(DnaError::MarkerNotFound {
                path: target.original.clone(),
                marker: marker.to_string(),
            })
        }
        Err(InsertError::Io(e)) => return Err(staging_err(e)),
    };

    sink.flush().map_err(staging_err)?;
    let staged = sink.into_inner().map_err(|e| staging_err(e.into_error()))?;
    staged.sync_all().map_err(staging_err)?;

    log::debug!(
        "Staged {} line(s) before line {} in {}",
        found.inserted,
        found.line,
        target.backup.display()
    );
    Ok(found)
}

/// Stage the edit and install it. Afterwards the original path holds the
/// new content and the backup path holds the previous content.
pub fn apply_edit<S: AsRef<str>>(
    target: &TargetFile,
    items: &[S],
    marker: &str,
) -> Result<MarkerFound, DnaError> {
    let found = stage(target, items, marker)?;
    target.swap()?;
    log::info!("Edited {}", target.original.display());
    Ok(found)
}
