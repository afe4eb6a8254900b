use std::fs;
use std::io;
use std::path::Path;

use crate::error::DnaError;

/// Exchange the contents of `staged` and `original`, using `parked` as
/// scratch space in the same directory.
///
/// `original` is only ever replaced by a rename, so it always holds a
/// complete file. Calling this twice with the same paths undoes the first
/// call, which is how a failed rebuild is rolled back.
pub fn swap(staged: &Path, original: &Path, parked: &Path) -> Result<(), DnaError> {
    match fs::remove_file(parked) {
        Ok(()) => log::warn!("Removed stale {}", parked.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(DnaError::swap(parked, parked, e)),
    }

    park(original, parked)?;

    log::debug!("rename {} -> {}", staged.display(), original.display());
    fs::rename(staged, original).map_err(|e| DnaError::swap(staged, original, e))?;

    log::debug!("rename {} -> {}", parked.display(), staged.display());
    fs::rename(parked, staged).map_err(|e| DnaError::swap(parked, staged, e))?;

    Ok(())
}

/// Keep the current content of `original` reachable at `parked`.
fn park(original: &Path, parked: &Path) -> Result<(), DnaError> {
    match fs::hard_link(original, parked) {
        Ok(()) => Ok(()),
        Err(e) => {
            log::warn!(
                "Hard link {} -> {} failed ({}), copying instead",
                original.display(),
                parked.display(),
                e
            );
            fs::copy(original, parked)
                .map(|_| ())
                .map_err(|e| DnaError::swap(original, parked, e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Triple {
        _temp: TempDir,
        staged: std::path::PathBuf,
        original: std::path::PathBuf,
        parked: std::path::PathBuf,
    }

    fn triple(original: &str, staged: &str) -> Triple {
        let temp = TempDir::new().unwrap();
        let t = Triple {
            staged: temp.path().join("configuration.nix.dna"),
            original: temp.path().join("configuration.nix"),
            parked: temp.path().join("configuration.nix.dnatmp"),
            _temp: temp,
        };
        fs::write(&t.original, original).unwrap();
        fs::write(&t.staged, staged).unwrap();
        t
    }

    #[test]
    fn test_swap_installs_staged_content() {
        let t = triple("old\n", "new\n");
        swap(&t.staged, &t.original, &t.parked).unwrap();

        assert_eq!(fs::read_to_string(&t.original).unwrap(), "new\n");
        assert_eq!(fs::read_to_string(&t.staged).unwrap(), "old\n");
        assert!(!t.parked.exists());
    }

    #[test]
    fn test_second_swap_restores_original() {
        let t = triple("old\n", "new\n");
        swap(&t.staged, &t.original, &t.parked).unwrap();
        swap(&t.staged, &t.original, &t.parked).unwrap();

        assert_eq!(fs::read_to_string(&t.original).unwrap(), "old\n");
        assert_eq!(fs::read_to_string(&t.staged).unwrap(), "new\n");
    }

    #[test]
    fn test_swap_replaces_stale_parked_file() {
        let t = triple("old\n", "new\n");
        fs::write(&t.parked, "leftover").unwrap();
        swap(&t.staged, &t.original, &t.parked).unwrap();

        assert_eq!(fs::read_to_string(&t.original).unwrap(), "new\n");
        assert_eq!(fs::read_to_string(&t.staged).unwrap(), "old\n");
        assert!(!t.parked.exists());
    }

    #[test]
    fn test_swap_missing_staged_keeps_original() {
        let t = triple("old\n", "new\n");
        fs::remove_file(&t.staged).unwrap();

        let err = swap(&t.staged, &t.original, &t.parked).unwrap_err();
        assert!(matches!(err, DnaError::Swap { .. }));
        assert_eq!(fs::read_to_string(&t.original).unwrap(), "old\n");
    }
}
