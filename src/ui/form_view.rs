use crate::calc::bounds::format_date_time;
use crate::calc::DateBounds;
use crate::data::{FieldConfig, FormData, PickerSettings};
use crate::ui::overlay::{OverlayRegistry, PickerEvent, TriggerHandle};
use crate::ui::popup::{key_action, render_popup};
use crate::ui::Tui;
use anyhow::{bail, Result};
use chrono::{NaiveDate, NaiveDateTime};
use crossterm::event::{
    self, Event as CEvent, KeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use std::time::Duration as StdDuration;

const HEADER_ROWS: u16 = 2;
const FOOTER_ROWS: u16 = 2;
/// Label row, trigger row, spacer.
const FIELD_SPACING: u16 = 3;
const TRIGGER_WIDTH: u16 = 24;

#[derive(PartialEq, Clone, Copy, Debug)]
pub enum Mode {
    /// Several fields, values saved to the form.
    Form,
    /// One field; the picker opens immediately and the first choice ends the run.
    Pick,
}

/// A date field of the form and its trigger registration, if it is on screen.
struct Field {
    label: String,
    bounds: DateBounds,
    handle: Option<TriggerHandle>,
}

pub struct App<'a> {
    form: &'a mut FormData,
    fields: Vec<Field>,
    overlay: OverlayRegistry,
    focus: usize,
    scroll: u16,
    viewport: Rect,
    today: NaiveDate,
    mode: Mode,
    /// Pick mode: the picker has been opened once.
    auto_opened: bool,
    /// Pick mode: the user chose a date.
    committed: bool,
    /// Last change message (message, color). Cleared on next input.
    status: Option<(String, Color)>,
}

impl<'a> App<'a> {
    pub fn new(
        configs: &[FieldConfig],
        form: &'a mut FormData,
        settings: &PickerSettings,
        today: NaiveDate,
        mode: Mode,
    ) -> Result<Self> {
        let fields = configs
            .iter()
            .map(|c| {
                Ok(Field {
                    label: c.label.clone(),
                    bounds: c.bounds()?,
                    handle: None,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        if fields.is_empty() {
            bail!("no date fields configured");
        }
        Ok(App {
            form,
            fields,
            overlay: OverlayRegistry::new(today, settings.min_year, settings.margin),
            focus: 0,
            scroll: 0,
            viewport: Rect::default(),
            today,
            mode,
            auto_opened: false,
            committed: false,
            status: None,
        })
    }

    /// The date chosen in pick mode, if the user committed to one.
    pub fn chosen(&self) -> Option<NaiveDateTime> {
        if !self.committed {
            return None;
        }
        self.fields.first().and_then(|f| self.form.get(&f.label))
    }

    pub fn resize(&mut self, viewport: Rect) {
        self.viewport = viewport;
        self.scroll = self.scroll.min(self.max_scroll());
        self.relayout();
        if self.mode == Mode::Pick && !self.auto_opened {
            self.open_focused();
            self.auto_opened = self.overlay.is_open();
        }
    }

    fn body(&self) -> Rect {
        regions(self.viewport)[1]
    }

    fn max_scroll(&self) -> u16 {
        (self.fields.len() as u16 * FIELD_SPACING).saturating_sub(self.body().height)
    }

    /// Syncs trigger registrations with the scrolled layout and moves the popup
    /// along with its trigger. Fields scrolled out of view are unregistered.
    fn relayout(&mut self) {
        let body = self.body();
        for (i, field) in self.fields.iter_mut().enumerate() {
            match trigger_rect(body, i, self.scroll) {
                Some(rect) => match field.handle {
                    Some(handle) => {
                        self.overlay.relayout(handle, rect);
                    }
                    None => field.handle = Some(self.overlay.register(rect)),
                },
                None => {
                    if let Some(handle) = field.handle.take() {
                        self.overlay.unregister(handle);
                    }
                }
            }
        }
        self.overlay.reposition(self.viewport);
    }

    fn scroll_by(&mut self, delta: i32) {
        let next = (self.scroll as i32 + delta).clamp(0, self.max_scroll() as i32) as u16;
        if next != self.scroll {
            self.scroll = next;
            self.relayout();
        }
    }

    fn move_focus(&mut self, delta: i32) {
        let len = self.fields.len() as i32;
        self.focus = (self.focus as i32 + delta).rem_euclid(len) as usize;
        self.ensure_focus_visible();
    }

    fn ensure_focus_visible(&mut self) {
        let top = self.focus as u16 * FIELD_SPACING;
        let height = self.body().height;
        if top < self.scroll {
            self.scroll_by(top as i32 - self.scroll as i32);
        } else if top + 2 > self.scroll + height {
            self.scroll_by((top + 2) as i32 - (self.scroll + height) as i32);
        }
    }

    fn open_focused(&mut self) {
        self.ensure_focus_visible();
        let field = &self.fields[self.focus];
        let Some(handle) = field.handle else {
            return;
        };
        let selected = self.form.get(&field.label);
        self.overlay
            .open(handle, selected, field.bounds, self.today, self.viewport);
    }

    fn clear_focused(&mut self) {
        let label = self.fields[self.focus].label.clone();
        if self.form.clear(&label).is_some() {
            self.status = Some((format!("{label} cleared"), Color::Yellow));
        }
    }

    fn field_index(&self, handle: TriggerHandle) -> Option<usize> {
        self.fields.iter().position(|f| f.handle == Some(handle))
    }

    /// Applies an overlay event. Returns true if the app should quit.
    fn handle_event(&mut self, event: PickerEvent) -> bool {
        match event {
            PickerEvent::DateChosen { handle, date } => {
                if let Some(i) = self.field_index(handle) {
                    let label = self.fields[i].label.clone();
                    self.form.set(&label, date);
                    self.status = Some((
                        format!("{label} set to {}", format_date_time(date)),
                        Color::Green,
                    ));
                }
                if self.mode == Mode::Pick {
                    self.committed = true;
                    return true;
                }
            }
            PickerEvent::TriggerClicked(handle) => {
                if let Some(i) = self.field_index(handle) {
                    self.focus = i;
                    if self.overlay.owner() == Some(handle) {
                        self.overlay.reposition(self.viewport);
                    } else {
                        self.open_focused();
                    }
                }
            }
            PickerEvent::Dismissed(_) => return self.mode == Mode::Pick,
        }
        false
    }

    /// Returns true if the app should quit.
    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
            return true;
        }
        self.status = None;

        if self.overlay.is_open() {
            let event = key_action(code).and_then(|action| self.overlay.dispatch(action));
            return match event {
                Some(event) => self.handle_event(event),
                None => false,
            };
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab | KeyCode::Down | KeyCode::Char('j') => self.move_focus(1),
            KeyCode::BackTab | KeyCode::Up | KeyCode::Char('k') => self.move_focus(-1),
            KeyCode::Enter | KeyCode::Char(' ') => self.open_focused(),
            KeyCode::Char('x') | KeyCode::Delete => self.clear_focused(),
            KeyCode::PageDown => self.scroll_by(FIELD_SPACING as i32),
            KeyCode::PageUp => self.scroll_by(-(FIELD_SPACING as i32)),
            _ => {}
        }
        false
    }

    /// Returns true if the app should quit.
    pub fn handle_mouse(&mut self, mouse: MouseEvent) -> bool {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.status = None;
                if let Some(event) = self.overlay.on_click(mouse.column, mouse.row) {
                    return self.handle_event(event);
                }
            }
            MouseEventKind::ScrollDown => self.scroll_by(1),
            MouseEventKind::ScrollUp => self.scroll_by(-1),
            _ => {}
        }
        false
    }

    pub fn render(&mut self, f: &mut Frame) {
        let area = f.area();
        if area != self.viewport {
            self.resize(area);
        }
        let chunks = regions(area);

        let title = match self.mode {
            Mode::Form => "Date picker",
            Mode::Pick => "Pick a date",
        };
        f.render_widget(
            Paragraph::new(Span::styled(
                title,
                Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            )),
            chunks[0],
        );

        for (i, field) in self.fields.iter().enumerate() {
            let Some(rect) = field.handle.and_then(|h| self.overlay.trigger_rect(h)) else {
                continue;
            };
            let focused = i == self.focus;
            let label_style = if focused {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let label_rect = Rect::new(rect.x, rect.y.saturating_sub(1), chunks[1].width, 1);
            f.render_widget(
                Paragraph::new(Span::styled(field.label.as_str(), label_style)),
                label_rect.intersection(chunks[1]),
            );

            let value = self
                .form
                .get(&field.label)
                .map(format_date_time)
                .unwrap_or_else(|| "-- pick a date --".to_string());
            f.render_widget(
                Paragraph::new(format!(" {value}"))
                    .style(trigger_style(focused, self.overlay.owner() == field.handle)),
                rect,
            );

            if let Some(hint) = bounds_hint(&field.bounds) {
                let x = rect.right() + 2;
                let width = chunks[1].right().saturating_sub(x);
                if width > 0 {
                    f.render_widget(
                        Paragraph::new(Span::styled(hint, Style::default().fg(Color::DarkGray))),
                        Rect::new(x, rect.y, width, 1),
                    );
                }
            }
        }

        let help = match self.mode {
            Mode::Form if self.overlay.is_open() => {
                "arrows move · Enter choose · PgUp/PgDn page · m/y view · Esc close"
            }
            Mode::Form => "Tab/↑↓ field · Enter open · x clear · wheel scroll · q quit",
            Mode::Pick => "arrows move · Enter choose · PgUp/PgDn page · m/y view · Esc cancel",
        };
        let status = match &self.status {
            Some((msg, color)) => Line::from(Span::styled(msg.as_str(), Style::default().fg(*color))),
            None => Line::from(""),
        };
        f.render_widget(
            Paragraph::new(vec![
                status,
                Line::from(Span::styled(help, Style::default().add_modifier(Modifier::DIM))),
            ]),
            chunks[2],
        );

        if let Some(layout) = self.overlay.popup().copied() {
            render_popup(f, &layout, self.overlay.picker(), self.today);
        }
    }
}

fn regions(viewport: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_ROWS),
            Constraint::Min(0),
            Constraint::Length(FOOTER_ROWS),
        ])
        .split(viewport)
}

/// Screen rect of the `index`-th trigger, or None when scrolled out of `body`.
fn trigger_rect(body: Rect, index: usize, scroll: u16) -> Option<Rect> {
    let top = body.y as i64 + index as i64 * FIELD_SPACING as i64 - scroll as i64;
    let trigger_row = top + 1;
    if top < body.y as i64 || trigger_row >= body.bottom() as i64 {
        return None;
    }
    let width = TRIGGER_WIDTH.min(body.width.saturating_sub(2));
    if width == 0 {
        return None;
    }
    Some(Rect::new(body.x + 2, trigger_row as u16, width, 1))
}

fn trigger_style(focused: bool, open: bool) -> Style {
    let style = if focused {
        Style::default().fg(Color::White).bg(Color::DarkGray)
    } else {
        Style::default().add_modifier(Modifier::UNDERLINED)
    };
    if open {
        style.add_modifier(Modifier::BOLD)
    } else {
        style
    }
}

fn bounds_hint(bounds: &DateBounds) -> Option<String> {
    match (bounds.min, bounds.max) {
        (Some(min), Some(max)) => Some(format!(
            "{} … {}",
            format_date_time(min),
            format_date_time(max)
        )),
        (Some(min), None) => Some(format!("from {}", format_date_time(min))),
        (None, Some(max)) => Some(format!("until {}", format_date_time(max))),
        (None, None) => None,
    }
}

// ── App event loop ────────────────────────────────────────────────────────────

pub fn run_app(terminal: &mut Tui, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| app.render(f))?;
        if event::poll(StdDuration::from_millis(16))? {
            let quit = match event::read()? {
                CEvent::Key(key) if key.kind == KeyEventKind::Press => {
                    app.handle_key(key.code, key.modifiers)
                }
                CEvent::Mouse(mouse) => app.handle_mouse(mouse),
                CEvent::Resize(width, height) => {
                    app.resize(Rect::new(0, 0, width, height));
                    false
                }
                _ => false,
            };
            if quit {
                break;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::PickerView;
    use ratatui::{backend::TestBackend, Terminal};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn dt(y: i32, m: u32, day: u32) -> NaiveDateTime {
        d(y, m, day).and_hms_opt(0, 0, 0).unwrap()
    }

    const TODAY: (i32, u32, u32) = (2024, 1, 15);

    fn today() -> NaiveDate {
        d(TODAY.0, TODAY.1, TODAY.2)
    }

    fn make_app<'a>(form: &'a mut FormData, configs: &[FieldConfig], mode: Mode) -> App<'a> {
        let mut app = App::new(configs, form, &PickerSettings::default(), today(), mode).unwrap();
        app.resize(Rect::new(0, 0, 80, 24));
        app
    }

    fn many_fields(n: usize) -> Vec<FieldConfig> {
        (0..n)
            .map(|i| FieldConfig::new(&format!("Field {i}"), None, None))
            .collect()
    }

    fn click(app: &mut App, column: u16, row: u16) -> bool {
        app.handle_mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::empty(),
        })
    }

    fn scroll_down(app: &mut App) {
        app.handle_mouse(MouseEvent {
            kind: MouseEventKind::ScrollDown,
            column: 0,
            row: 0,
            modifiers: KeyModifiers::empty(),
        });
    }

    fn key(app: &mut App, code: KeyCode) -> bool {
        app.handle_key(code, KeyModifiers::empty())
    }

    fn trigger(app: &App, index: usize) -> Rect {
        app.overlay
            .trigger_rect(app.fields[index].handle.unwrap())
            .unwrap()
    }

    fn day_pos(app: &App, date: NaiveDate) -> (u16, u16) {
        let picker = app.overlay.picker();
        let index = picker
            .day_cells()
            .iter()
            .position(|c| c.date.date() == date)
            .unwrap();
        let rect = app.overlay.popup().unwrap().cell_rect(picker, index);
        (rect.x, rect.y)
    }

    #[test]
    fn test_new_rejects_empty_field_list() {
        let mut form = FormData::default();
        let result = App::new(&[], &mut form, &PickerSettings::default(), today(), Mode::Form);
        assert!(result.is_err());
    }

    #[test]
    fn test_new_rejects_bad_bounds() {
        let mut form = FormData::default();
        let configs = vec![FieldConfig::new("Bad", Some("soon"), None)];
        let result = App::new(&configs, &mut form, &PickerSettings::default(), today(), Mode::Form);
        assert!(result.is_err());
    }

    #[test]
    fn test_resize_registers_visible_triggers() {
        let mut form = FormData::default();
        let app = make_app(&mut form, &PickerSettings::default().fields, Mode::Form);
        assert!(app.fields.iter().all(|f| f.handle.is_some()));
        assert_eq!(trigger(&app, 0), Rect::new(2, 3, TRIGGER_WIDTH, 1));
        assert_eq!(trigger(&app, 1).y, 6);
    }

    #[test]
    fn test_enter_opens_and_enter_chooses() {
        let mut form = FormData::default();
        {
            let mut app = make_app(&mut form, &PickerSettings::default().fields, Mode::Form);
            key(&mut app, KeyCode::Enter);
            assert!(app.overlay.is_open());
            // cursor starts on Jan 1 2024, move one week down
            key(&mut app, KeyCode::Down);
            assert!(!key(&mut app, KeyCode::Enter));
            assert!(!app.overlay.is_open());
            assert!(app.status.is_some());
        }
        assert_eq!(form.get("Start date"), Some(dt(2024, 1, 8)));
    }

    #[test]
    fn test_esc_closes_picker_then_quits() {
        let mut form = FormData::default();
        let mut app = make_app(&mut form, &PickerSettings::default().fields, Mode::Form);
        key(&mut app, KeyCode::Enter);
        assert!(!key(&mut app, KeyCode::Esc));
        assert!(!app.overlay.is_open());
        assert!(key(&mut app, KeyCode::Esc));
    }

    #[test]
    fn test_q_ignored_while_picker_open() {
        let mut form = FormData::default();
        let mut app = make_app(&mut form, &PickerSettings::default().fields, Mode::Form);
        key(&mut app, KeyCode::Enter);
        assert!(!key(&mut app, KeyCode::Char('q')));
        assert!(app.overlay.is_open());
        assert!(app.handle_key(KeyCode::Char('c'), KeyModifiers::CONTROL));
    }

    #[test]
    fn test_tab_cycles_focus() {
        let mut form = FormData::default();
        let mut app = make_app(&mut form, &PickerSettings::default().fields, Mode::Form);
        key(&mut app, KeyCode::Tab);
        assert_eq!(app.focus, 1);
        key(&mut app, KeyCode::BackTab);
        key(&mut app, KeyCode::BackTab);
        assert_eq!(app.focus, 2);
    }

    #[test]
    fn test_click_trigger_opens_that_field() {
        let mut form = FormData::default();
        let mut app = make_app(&mut form, &PickerSettings::default().fields, Mode::Form);
        let rect = trigger(&app, 1);
        click(&mut app, rect.x + 1, rect.y);
        assert_eq!(app.focus, 1);
        assert_eq!(app.overlay.owner(), app.fields[1].handle);
        let popup = app.overlay.popup().unwrap().area;
        assert_eq!(popup.y, rect.bottom() + 1);
    }

    #[test]
    fn test_click_outside_closes() {
        let mut form = FormData::default();
        let mut app = make_app(&mut form, &PickerSettings::default().fields, Mode::Form);
        key(&mut app, KeyCode::Enter);
        click(&mut app, 70, 20);
        assert!(!app.overlay.is_open());
    }

    #[test]
    fn test_click_day_before_min_date_keeps_open() {
        let mut form = FormData::default();
        let mut app = make_app(&mut form, &PickerSettings::default().fields, Mode::Form);
        // "End date" has min_date 2024-01-10
        let rect = trigger(&app, 1);
        click(&mut app, rect.x, rect.y);
        let (x, y) = day_pos(&app, d(2024, 1, 5));
        click(&mut app, x, y);
        assert!(app.overlay.is_open());
        assert_eq!(app.form.get("End date"), None);

        let (x, y) = day_pos(&app, d(2024, 1, 12));
        click(&mut app, x, y);
        assert!(!app.overlay.is_open());
        assert_eq!(app.form.get("End date"), Some(dt(2024, 1, 12)));
    }

    #[test]
    fn test_reopen_starts_at_stored_value() {
        let mut form = FormData::default();
        form.set("Start date", dt(2019, 6, 3));
        let mut app = make_app(&mut form, &PickerSettings::default().fields, Mode::Form);
        key(&mut app, KeyCode::Enter);
        let picker = app.overlay.picker();
        assert_eq!((picker.nav.month, picker.nav.year), (5, 2019));
        assert_eq!(picker.view(), PickerView::Days);
    }

    #[test]
    fn test_x_clears_value() {
        let mut form = FormData::default();
        form.set("Start date", dt(2019, 6, 3));
        {
            let mut app = make_app(&mut form, &PickerSettings::default().fields, Mode::Form);
            key(&mut app, KeyCode::Char('x'));
        }
        assert_eq!(form.get("Start date"), None);
    }

    #[test]
    fn test_scroll_repositions_popup() {
        let mut form = FormData::default();
        let configs = many_fields(8);
        let mut app = App::new(&configs, &mut form, &PickerSettings::default(), today(), Mode::Form)
            .unwrap();
        app.resize(Rect::new(0, 0, 80, 20));
        key(&mut app, KeyCode::Tab);
        key(&mut app, KeyCode::Enter);
        let before = app.overlay.popup().unwrap().area;
        scroll_down(&mut app);
        let after = app.overlay.popup().unwrap().area;
        assert_eq!(after.y + 1, before.y);
        assert_eq!(after.y, trigger(&app, 1).bottom() + 1);
    }

    #[test]
    fn test_scrolling_trigger_out_of_view_closes_popup() {
        let mut form = FormData::default();
        let configs = many_fields(8);
        let mut app = App::new(&configs, &mut form, &PickerSettings::default(), today(), Mode::Form)
            .unwrap();
        app.resize(Rect::new(0, 0, 80, 20));
        key(&mut app, KeyCode::Enter);
        scroll_down(&mut app);
        assert!(app.fields[0].handle.is_none());
        assert!(!app.overlay.is_open());
    }

    #[test]
    fn test_focus_scrolls_into_view() {
        let mut form = FormData::default();
        let configs = many_fields(8);
        let mut app = App::new(&configs, &mut form, &PickerSettings::default(), today(), Mode::Form)
            .unwrap();
        app.resize(Rect::new(0, 0, 80, 20));
        for _ in 0..7 {
            key(&mut app, KeyCode::Tab);
        }
        assert_eq!(app.focus, 7);
        assert!(app.fields[7].handle.is_some());
        assert!(app.scroll > 0);
    }

    #[test]
    fn test_pick_mode_auto_opens_and_commits() {
        let mut form = FormData::default();
        let configs = vec![FieldConfig::new("Date", None, None)];
        let mut app = make_app(&mut form, &configs, Mode::Pick);
        assert!(app.overlay.is_open());
        key(&mut app, KeyCode::Right);
        assert!(key(&mut app, KeyCode::Enter));
        assert_eq!(app.chosen(), Some(dt(2024, 1, 2)));
    }

    #[test]
    fn test_pick_mode_opens_once_terminal_grows() {
        let mut form = FormData::default();
        let configs = vec![FieldConfig::new("Date", None, None)];
        let mut app =
            App::new(&configs, &mut form, &PickerSettings::default(), today(), Mode::Pick).unwrap();
        app.resize(Rect::new(0, 0, 80, 5));
        assert!(app.fields[0].handle.is_none());
        assert!(!app.overlay.is_open());
        app.resize(Rect::new(0, 0, 80, 24));
        assert!(app.overlay.is_open());
    }

    #[test]
    fn test_pick_mode_esc_cancels() {
        let mut form = FormData::default();
        let configs = vec![FieldConfig::new("Date", None, None)];
        let mut app = make_app(&mut form, &configs, Mode::Pick);
        assert!(key(&mut app, KeyCode::Esc));
        assert_eq!(app.chosen(), None);
    }

    #[test]
    fn test_bounds_hint() {
        assert_eq!(bounds_hint(&DateBounds::default()), None);
        let min_only = DateBounds::new(Some(dt(2024, 1, 10)), None);
        assert_eq!(bounds_hint(&min_only).unwrap(), "from 2024-01-10");
        let max_only = DateBounds::new(None, Some(dt(2024, 1, 10)));
        assert_eq!(bounds_hint(&max_only).unwrap(), "until 2024-01-10");
    }

    #[test]
    fn test_render_shows_fields_and_popup() {
        let mut form = FormData::default();
        form.set("Start date", dt(2024, 2, 14));
        let mut app = App::new(
            &PickerSettings::default().fields,
            &mut form,
            &PickerSettings::default(),
            today(),
            Mode::Form,
        )
        .unwrap();
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();
        key(&mut app, KeyCode::Enter);
        terminal.draw(|f| app.render(f)).unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Start date"));
        assert!(text.contains("from 2024-01-10"));
        assert!(text.contains("February 2024"));
    }
}
