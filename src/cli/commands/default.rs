use crate::cli::Output;
use crate::config::Preferences;
use anyhow::Result;
use std::path::Path;

pub fn run(path: &Path) -> Result<()> {
    let prefs = Preferences::from_home()?;
    let canonical = prefs.save(path)?;

    Output::success(&format!(
        "Set {} as default config file",
        canonical.display()
    ));
    Output::info(&format!("Stored in {}", prefs.path().display()));
    Ok(())
}
