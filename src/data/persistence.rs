use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

/// A document stored as one file in the data directory.
pub trait Persistable: Sized + Default + Serialize + for<'de> Deserialize<'de> {
    fn filename() -> &'static str;
    fn format() -> Format;

    /// Reads the file from `dir`, falling back to `Default` when it does not exist.
    fn load_from(dir: &Path) -> Result<Self> {
        let path = dir.join(Self::filename());
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        match Self::format() {
            Format::Json => serde_json::from_str(&contents)
                .with_context(|| format!("failed to parse JSON from {}", path.display())),
            Format::Yaml => serde_norway::from_str(&contents)
                .with_context(|| format!("failed to parse YAML from {}", path.display())),
        }
    }

    fn save_to(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create dir {}", dir.display()))?;
        let path = dir.join(Self::filename());
        let contents = match Self::format() {
            Format::Json => serde_json::to_string_pretty(self).context("failed to serialize JSON")?,
            Format::Yaml => serde_norway::to_string(self).context("failed to serialize YAML")?,
        };
        fs::write(&path, contents)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}
