use crate::calc::bounds::{format_date_time, parse_date_time};
use crate::data::{FieldConfig, FormData, PickerSettings};
use crate::ui::form_view::{run_app, App, Mode};
use crate::ui::{install_panic_hook, restore_terminal, setup_terminal};
use anyhow::{Context, Result};
use chrono::Local;
use std::path::Path;

const PICK_LABEL: &str = "Date";

/// Builds the single field and prefilled form for a one-shot pick.
pub(crate) fn prepare(
    date: Option<&str>,
    min: Option<&str>,
    max: Option<&str>,
) -> Result<(FieldConfig, FormData)> {
    let field = FieldConfig::new(PICK_LABEL, min, max);
    field.bounds()?;
    let mut form = FormData::default();
    if let Some(raw) = date {
        let initial = parse_date_time(raw).context("bad --date")?;
        form.set(PICK_LABEL, initial);
    }
    Ok((field, form))
}

/// Opens the picker and prints the chosen date; prints nothing when cancelled.
pub fn run(data_dir: &Path, date: Option<&str>, min: Option<&str>, max: Option<&str>) -> Result<()> {
    let settings = PickerSettings::load(data_dir)?;
    let (field, mut form) = prepare(date, min, max)?;
    let today = Local::now().date_naive();

    let mut app = App::new(
        std::slice::from_ref(&field),
        &mut form,
        &settings,
        today,
        Mode::Pick,
    )?;

    install_panic_hook();
    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, &mut app);
    restore_terminal(&mut terminal)?;
    result?;

    if let Some(chosen) = app.chosen() {
        println!("{}", format_date_time(chosen));
    }
    Ok(())
}
