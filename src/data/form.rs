use crate::data::persistence::{Format, Persistable};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Dates chosen in the form, keyed by field label.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct FormData {
    pub values: BTreeMap<String, NaiveDateTime>,
}

impl Persistable for FormData {
    fn filename() -> &'static str {
        "form.json"
    }
    fn format() -> Format {
        Format::Json
    }
}

impl FormData {
    pub fn get(&self, label: &str) -> Option<NaiveDateTime> {
        self.values.get(label).copied()
    }

    pub fn set(&mut self, label: &str, date: NaiveDateTime) {
        self.values.insert(label.to_string(), date);
    }

    pub fn clear(&mut self, label: &str) -> Option<NaiveDateTime> {
        self.values.remove(label)
    }
}
