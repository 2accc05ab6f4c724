//! Save payload holding the preparation toggle.

use std::{fs, io::ErrorKind, path::Path};

use anyhow::{Context, Result};
use battle_prepare_core::PrepareSettings;

/// Loads settings from a save file; a missing file yields the defaults.
pub(crate) fn load(path: &Path) -> Result<PrepareSettings> {
    match fs::read_to_string(path) {
        Ok(text) => serde_json::from_str(&text)
            .with_context(|| format!("failed to parse save {}", path.display())),
        Err(error) if error.kind() == ErrorKind::NotFound => Ok(PrepareSettings::default()),
        Err(error) => {
            Err(error).with_context(|| format!("failed to read save {}", path.display()))
        }
    }
}

/// Writes settings to a save file, replacing its contents.
pub(crate) fn store(path: &Path, settings: &PrepareSettings) -> Result<()> {
    let text = serde_json::to_string_pretty(settings).context("failed to encode save")?;
    fs::write(path, text).with_context(|| format!("failed to write save {}", path.display()))
}
