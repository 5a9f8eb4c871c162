use crate::calc::grid::{is_same_day, month_abbrev, month_name, WEEKDAY_HEADERS};
use crate::calc::{PickerAction, PickerState, PickerView};
use crate::ui::geometry::contains;
use chrono::{Datelike, NaiveDate};
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

pub const POPUP_WIDTH: u16 = 23;
pub const POPUP_HEIGHT: u16 = 10;

const DAY_CELL_WIDTH: u16 = 3;
const MONTH_CELL_WIDTH: u16 = 7;
const YEAR_CELL_WIDTH: u16 = 5;
const ARROW_WIDTH: u16 = 2;

const CURSOR_BG: Color = Color::Cyan;

/// What a mouse position inside the popup refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PopupHit {
    Backward,
    Forward,
    MonthTitle,
    YearTitle,
    Cell(usize),
}

/// Cell geometry of a popup placed at `area`, shared by drawing and hit testing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PopupLayout {
    pub area: Rect,
    inner: Rect,
}

impl PopupLayout {
    pub fn new(area: Rect) -> Self {
        let inner = Block::default().borders(Borders::ALL).inner(area);
        PopupLayout { area, inner }
    }

    fn grid_top(&self) -> u16 {
        self.inner.y + 2
    }

    fn cell_width(view: PickerView) -> u16 {
        match view {
            PickerView::Days => DAY_CELL_WIDTH,
            PickerView::Months => MONTH_CELL_WIDTH,
            PickerView::Years => YEAR_CELL_WIDTH,
        }
    }

    pub fn cell_rect(&self, state: &PickerState, index: usize) -> Rect {
        let columns = state.columns();
        let width = Self::cell_width(state.view());
        let col = (index % columns) as u16;
        let row = (index / columns) as u16;
        Rect::new(self.inner.x + col * width, self.grid_top() + row, width, 1)
            .intersection(self.inner)
    }

    fn backward_rect(&self) -> Rect {
        Rect::new(self.inner.x, self.inner.y, ARROW_WIDTH, 1)
    }

    fn forward_rect(&self) -> Rect {
        Rect::new(
            self.inner.right().saturating_sub(ARROW_WIDTH),
            self.inner.y,
            ARROW_WIDTH,
            1,
        )
    }

    /// Column where the centred header title starts.
    fn title_start(&self, title: &str) -> u16 {
        let len = title.chars().count() as u16;
        self.inner.x + self.inner.width.saturating_sub(len) / 2
    }

    pub fn hit(&self, state: &PickerState, column: u16, row: u16) -> Option<PopupHit> {
        if !contains(self.inner, column, row) {
            return None;
        }
        if row == self.inner.y {
            return self.hit_header(state, column);
        }
        (0..state.cell_count())
            .find(|&i| contains(self.cell_rect(state, i), column, row))
            .map(PopupHit::Cell)
    }

    fn hit_header(&self, state: &PickerState, column: u16) -> Option<PopupHit> {
        let row = self.inner.y;
        if contains(self.backward_rect(), column, row) {
            return Some(PopupHit::Backward);
        }
        if contains(self.forward_rect(), column, row) {
            return Some(PopupHit::Forward);
        }
        let title = header_title(state);
        let start = self.title_start(&title);
        let end = start + title.chars().count() as u16;
        if column < start || column >= end {
            return None;
        }
        match state.view() {
            PickerView::Days => {
                let month_end = start + month_name(state.nav.month).len() as u16;
                if column < month_end {
                    Some(PopupHit::MonthTitle)
                } else if column > month_end {
                    Some(PopupHit::YearTitle)
                } else {
                    None
                }
            }
            PickerView::Months => Some(PopupHit::YearTitle),
            PickerView::Years => None,
        }
    }
}

fn header_title(state: &PickerState) -> String {
    match state.view() {
        PickerView::Days => format!("{} {}", month_name(state.nav.month), state.nav.year),
        PickerView::Months => state.nav.year.to_string(),
        PickerView::Years => {
            let page = state.year_page();
            match (page.first(), page.last()) {
                (Some(first), Some(last)) => format!("{first} - {last}"),
                _ => String::new(),
            }
        }
    }
}

/// Turns a hit into the action it triggers in the current view.
pub fn hit_action(state: &PickerState, hit: PopupHit) -> Option<PickerAction> {
    match hit {
        PopupHit::Backward => Some(PickerAction::Backward),
        PopupHit::Forward => Some(PickerAction::Forward),
        PopupHit::MonthTitle => Some(PickerAction::ToggleView(PickerView::Months)),
        PopupHit::YearTitle => Some(PickerAction::ToggleView(PickerView::Years)),
        PopupHit::Cell(index) => match state.view() {
            PickerView::Days => state
                .day_cells()
                .get(index)
                .copied()
                .map(PickerAction::ChooseCell),
            PickerView::Months => Some(PickerAction::ChooseMonth(index as u32)),
            PickerView::Years => state
                .year_page()
                .get(index)
                .copied()
                .map(PickerAction::ChooseYear),
        },
    }
}

pub fn key_action(code: KeyCode) -> Option<PickerAction> {
    let action = match code {
        KeyCode::Left => PickerAction::MoveCursor { dx: -1, dy: 0 },
        KeyCode::Right => PickerAction::MoveCursor { dx: 1, dy: 0 },
        KeyCode::Up => PickerAction::MoveCursor { dx: 0, dy: -1 },
        KeyCode::Down => PickerAction::MoveCursor { dx: 0, dy: 1 },
        KeyCode::PageUp => PickerAction::Backward,
        KeyCode::PageDown => PickerAction::Forward,
        KeyCode::Char('d') => PickerAction::ToggleView(PickerView::Days),
        KeyCode::Char('m') => PickerAction::ToggleView(PickerView::Months),
        KeyCode::Char('y') => PickerAction::ToggleView(PickerView::Years),
        KeyCode::Enter | KeyCode::Char(' ') => PickerAction::ActivateCursor,
        KeyCode::Esc => PickerAction::Hide,
        _ => return None,
    };
    Some(action)
}

/// Style for one day cell, most specific state first.
pub(crate) fn day_style(
    is_cursor: bool,
    is_active: bool,
    is_disabled: bool,
    is_out_of_bounds: bool,
    is_today: bool,
) -> Style {
    if is_cursor {
        Style::default()
            .fg(Color::Black)
            .bg(CURSOR_BG)
            .add_modifier(Modifier::BOLD)
    } else if is_active {
        Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD)
    } else if is_out_of_bounds {
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::CROSSED_OUT)
    } else if is_disabled {
        Style::default().add_modifier(Modifier::DIM)
    } else if is_today {
        Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    } else {
        Style::default()
    }
}

pub fn render_popup(f: &mut Frame, layout: &PopupLayout, state: &PickerState, today: NaiveDate) {
    f.render_widget(Clear, layout.area);
    f.render_widget(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Gray)),
        layout.area,
    );
    if layout.inner.height < 2 {
        return;
    }

    let header = Rect::new(layout.inner.x, layout.inner.y, layout.inner.width, 1);
    f.render_widget(
        Paragraph::new(header_title(state))
            .alignment(Alignment::Center)
            .style(Style::default().add_modifier(Modifier::BOLD)),
        header,
    );
    f.render_widget(Paragraph::new("<"), layout.backward_rect());
    f.render_widget(
        Paragraph::new(">").alignment(Alignment::Right),
        layout.forward_rect(),
    );

    match state.view() {
        PickerView::Days => render_days(f, layout, state, today),
        PickerView::Months => render_months(f, layout, state),
        PickerView::Years => render_years(f, layout, state),
    }
}

fn render_days(f: &mut Frame, layout: &PopupLayout, state: &PickerState, today: NaiveDate) {
    let weekdays = Rect::new(layout.inner.x, layout.inner.y + 1, layout.inner.width, 1);
    f.render_widget(
        Paragraph::new(Line::from(WEEKDAY_HEADERS.join(" ")))
            .style(Style::default().add_modifier(Modifier::DIM)),
        weekdays,
    );

    for (i, cell) in state.day_cells().iter().enumerate() {
        let date = cell.date.date();
        let style = day_style(
            i == state.cursor,
            state.is_active(date),
            cell.disabled,
            !state.bounds.permits(cell.date),
            is_same_day(date, today),
        );
        let text = Span::styled(format!("{:>2}", date.day()), style);
        f.render_widget(Paragraph::new(text), layout.cell_rect(state, i));
    }
}

fn render_months(f: &mut Frame, layout: &PopupLayout, state: &PickerState) {
    let selected = state.selected.map(|s| (s.year(), s.month0()));
    for month in 0..12u32 {
        let index = month as usize;
        let style = if index == state.cursor {
            day_style(true, false, false, false, false)
        } else if selected == Some((state.nav.year, month)) {
            day_style(false, true, false, false, false)
        } else {
            Style::default()
        };
        f.render_widget(
            Paragraph::new(Span::styled(month_abbrev(month), style)).alignment(Alignment::Center),
            layout.cell_rect(state, index),
        );
    }
}

fn render_years(f: &mut Frame, layout: &PopupLayout, state: &PickerState) {
    let selected_year = state.selected.map(|s| s.year());
    for (i, year) in state.year_page().into_iter().enumerate() {
        let style = day_style(
            i == state.cursor,
            selected_year == Some(year),
            false,
            !state.nav.is_year_selectable(year),
            false,
        );
        f.render_widget(
            Paragraph::new(Span::styled(year.to_string(), style)).alignment(Alignment::Center),
            layout.cell_rect(state, i),
        );
    }
}
