use crate::data::{FormData, Persistable, PickerSettings};
use anyhow::Result;
use std::path::Path;

pub fn run(dir: &Path) -> Result<()> {
    run_in_dir(dir)?;
    println!("Data files initialized in {}.", dir.display());
    Ok(())
}

/// Writes the default config.yaml and an empty form.json into `dir`.
pub(crate) fn run_in_dir(dir: &Path) -> Result<()> {
    PickerSettings::default().save(dir)?;
    FormData::default().save_to(dir)?;
    Ok(())
}
