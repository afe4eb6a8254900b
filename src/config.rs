use crate::error::DnaError;
use std::io;
use std::path::{Path, PathBuf};

/// Line that marks where new packages are inserted.
pub const MARKER: &str = "# DNA-MARK";

/// Built-in configuration location on NixOS.
pub const DEFAULT_CONFIG: &str = "/etc/nixos/configuration.nix";

/// Appended to the canonical config path for the retained backup.
pub const BACKUP_SUFFIX: &str = ".dna";

/// Appended to the canonical config path for the swap scratch file.
pub const TEMP_SUFFIX: &str = ".dnatmp";

pub const REBUILD_PROGRAM: &str = "nixos-rebuild";
pub const REBUILD_ARGS: [&str; 2] = ["switch", "--show-trace"];

/// Starting size of the rebuild output buffer.
pub const CAPTURE_INITIAL: usize = 256;

/// Rebuild output beyond this many bytes is discarded.
pub const CAPTURE_CAP: usize = 2 << 30;

/// Format one package as a line of a Nix list.
pub fn format_item(item: &str) -> String {
    format!("  \"{}\"", item)
}

/// Where the user's persistent default config path lives.
#[derive(Debug, Clone)]
pub struct Preferences {
    dir: PathBuf,
}

impl Preferences {
    pub fn new(home: &Path) -> Self {
        Self {
            dir: home.join(".config"),
        }
    }

    pub fn from_home() -> Result<Self, DnaError> {
        let home = home::home_dir().ok_or(DnaError::HomeNotFound)?;
        Ok(Self::new(&home))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(".dna")
    }

    /// First line of the preference file, or `None` when it was never set.
    pub fn load(&self) -> Result<Option<PathBuf>, DnaError> {
        let path = self.path();
        let content = match std::fs::read(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(DnaError::Preference { path, source }),
        };

        let line = content
            .split(|&b| b == b'\n')
            .next()
            .unwrap_or_default()
            .trim_ascii();
        if line.is_empty() {
            return Err(DnaError::Preference {
                path,
                source: io::Error::new(io::ErrorKind::InvalidData, "file is empty"),
            });
        }
        Ok(Some(path_from_bytes(line)))
    }

    /// Canonicalize `config` and persist it as the default.
    /// Returns the canonical path that was written.
    pub fn save(&self, config: &Path) -> Result<PathBuf, DnaError> {
        let canonical =
            std::fs::canonicalize(config).map_err(|source| DnaError::Preference {
                path: config.to_path_buf(),
                source,
            })?;

        std::fs::create_dir_all(&self.dir).map_err(|source| DnaError::Preference {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.path();
        std::fs::write(&path, path_to_bytes(&canonical))
            .map_err(|source| DnaError::Preference { path, source })?;

        log::debug!("Stored default config {}", canonical.display());
        Ok(canonical)
    }
}

#[cfg(unix)]
fn path_to_bytes(path: &Path) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    path.as_os_str().as_bytes().to_vec()
}

#[cfg(not(unix))]
fn path_to_bytes(path: &Path) -> Vec<u8> {
    path.to_string_lossy().into_owned().into_bytes()
}

#[cfg(unix)]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(std::ffi::OsStr::from_bytes(bytes))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
}

/// Where the config path came from, so the CLI can explain itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Override,
    Preference,
    BuiltIn,
}

/// Pick the config file to edit: explicit override, then the stored
/// preference, then [`DEFAULT_CONFIG`]. `prefs` is only consulted without
/// an override.
pub fn resolve_config_path<F>(
    explicit: Option<&Path>,
    prefs: F,
) -> Result<(PathBuf, ConfigSource), DnaError>
where
    F: FnOnce() -> Result<Preferences, DnaError>,
{
    if let Some(path) = explicit {
        return Ok((path.to_path_buf(), ConfigSource::Override));
    }

    match prefs()?.load()? {
        Some(path) => Ok((path, ConfigSource::Preference)),
        None => Ok((PathBuf::from(DEFAULT_CONFIG), ConfigSource::BuiltIn)),
    }
}
