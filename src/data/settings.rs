use crate::calc::bounds::{parse_bound, DateBounds};
use crate::calc::navigator::{MAX_YEAR, MIN_YEAR};
use crate::data::persistence::{Format, Persistable};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One date field of the form. Bounds are `YYYY-MM-DD` or `YYYY-MM-DD HH:MM`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FieldConfig {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_date: Option<String>,
}

impl FieldConfig {
    pub fn new(label: &str, min_date: Option<&str>, max_date: Option<&str>) -> Self {
        FieldConfig {
            label: label.to_string(),
            min_date: min_date.map(str::to_string),
            max_date: max_date.map(str::to_string),
        }
    }

    pub fn bounds(&self) -> Result<DateBounds> {
        let min = parse_bound(self.min_date.as_deref())
            .with_context(|| format!("bad min_date for field '{}'", self.label))?;
        let max = parse_bound(self.max_date.as_deref())
            .with_context(|| format!("bad max_date for field '{}'", self.label))?;
        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                bail!("field '{}': min_date {min} is after max_date {max}", self.label);
            }
        }
        Ok(DateBounds::new(min, max))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PickerSettings {
    /// Earliest year reachable by navigation.
    pub min_year: i32,
    /// Rows between the trigger and the popup.
    pub margin: u16,
    pub fields: Vec<FieldConfig>,
}

impl Default for PickerSettings {
    fn default() -> Self {
        PickerSettings {
            min_year: MIN_YEAR,
            margin: 1,
            fields: vec![
                FieldConfig::new("Start date", None, None),
                FieldConfig::new("End date", Some("2024-01-10"), None),
                FieldConfig::new(
                    "Review meeting",
                    Some("2025-01-01 09:00"),
                    Some("2026-12-31 17:00"),
                ),
            ],
        }
    }
}

/// Reads the `settings` key of config.yaml; a missing key yields defaults.
#[derive(Serialize, Deserialize, Default, Debug)]
struct SettingsWrapper {
    #[serde(default)]
    settings: PickerSettings,
}

impl Persistable for SettingsWrapper {
    fn filename() -> &'static str {
        "config.yaml"
    }
    fn format() -> Format {
        Format::Yaml
    }
}

impl PickerSettings {
    pub fn load(dir: &Path) -> Result<Self> {
        let settings = SettingsWrapper::load_from(dir)?.settings;
        settings.validate()?;
        Ok(settings)
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        SettingsWrapper {
            settings: self.clone(),
        }
        .save_to(dir)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_YEAR).contains(&self.min_year) {
            bail!("min_year {} must be between 1 and {MAX_YEAR}", self.min_year);
        }
        for field in &self.fields {
            field.bounds()?;
        }
        Ok(())
    }
}
