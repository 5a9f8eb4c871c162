use crate::data::{FormData, Persistable, PickerSettings};
use crate::ui::form_view::{run_app, App, Mode};
use crate::ui::{install_panic_hook, restore_terminal, setup_terminal};
use anyhow::Result;
use chrono::Local;
use std::path::Path;
use tracing::info;

pub fn run(data_dir: &Path) -> Result<()> {
    let settings = PickerSettings::load(data_dir)?;
    let mut form = FormData::load_from(data_dir)?;
    let today = Local::now().date_naive();

    let mut app = App::new(&settings.fields, &mut form, &settings, today, Mode::Form)?;
    info!(fields = settings.fields.len(), "starting form");

    install_panic_hook();
    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, &mut app);
    let restored = restore_terminal(&mut terminal);

    // Release the app's borrow on the form before saving it
    drop(app);
    save_form(&form, data_dir)?;

    restored?;
    result
}

/// Writes the form's chosen values back to `form.json`.
fn save_form(form: &FormData, data_dir: &Path) -> Result<()> {
    form.save_to(data_dir)?;
    info!("form saved");
    Ok(())
}
