use crate::calc::bounds::DateBounds;
use crate::calc::grid::{
    build_month_grid, is_same_day, surrounding_years, CalendarCell, GRID_CELLS, WEEK_LEN,
    YEAR_CELLS,
};
use crate::calc::navigator::{Navigator, PickerView};
use chrono::{NaiveDate, NaiveDateTime};
use tracing::debug;

const MONTH_COLUMNS: usize = 3;
const YEAR_COLUMNS: usize = 4;

/// Everything the popup needs to draw itself and react to input.
#[derive(Clone, Debug, PartialEq)]
pub struct PickerState {
    pub visible: bool,
    pub nav: Navigator,
    pub selected: Option<NaiveDateTime>,
    pub bounds: DateBounds,
    /// Keyboard focus, an index into the current view's cells.
    pub cursor: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PickerAction {
    Show,
    Hide,
    Backward,
    Forward,
    ToggleView(PickerView),
    ChooseMonth(u32),
    ChooseYear(i32),
    ChooseCell(CalendarCell),
    MoveCursor { dx: i32, dy: i32 },
    ActivateCursor,
}

/// Result of applying one action: the next state and the date the user
/// committed to, if any.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub state: PickerState,
    pub chosen: Option<NaiveDateTime>,
}

impl Transition {
    fn quiet(state: PickerState) -> Self {
        Transition {
            state,
            chosen: None,
        }
    }
}

impl PickerState {
    /// Hidden picker parked on the month containing `today`.
    pub fn new(today: NaiveDate, min_year: i32) -> Self {
        PickerState {
            visible: false,
            nav: Navigator::at(today, min_year),
            selected: None,
            bounds: DateBounds::default(),
            cursor: 0,
        }
    }

    /// Visible picker showing the selected date's month, or today's.
    pub fn open_at(
        selected: Option<NaiveDateTime>,
        bounds: DateBounds,
        today: NaiveDate,
        min_year: i32,
    ) -> Self {
        let anchor = selected.map(|s| s.date()).unwrap_or(today);
        PickerState {
            visible: true,
            nav: Navigator::at(anchor, min_year),
            selected,
            bounds,
            cursor: 0,
        }
        .with_default_cursor()
    }

    pub fn view(&self) -> PickerView {
        self.nav.view
    }

    /// Day grid for the displayed month, carrying the selection's time of day.
    pub fn day_cells(&self) -> Vec<CalendarCell> {
        build_month_grid(self.nav.year, self.nav.month, self.selected.map(|s| s.time()))
    }

    pub fn year_page(&self) -> Vec<i32> {
        surrounding_years(self.nav.year)
    }

    /// Whether `date` is the currently selected day.
    pub fn is_active(&self, date: NaiveDate) -> bool {
        self.selected
            .is_some_and(|selected| is_same_day(selected.date(), date))
    }

    pub fn cell_count(&self) -> usize {
        match self.nav.view {
            PickerView::Days => GRID_CELLS,
            PickerView::Months => 12,
            PickerView::Years => YEAR_CELLS as usize,
        }
    }

    pub fn columns(&self) -> usize {
        match self.nav.view {
            PickerView::Days => WEEK_LEN,
            PickerView::Months => MONTH_COLUMNS,
            PickerView::Years => YEAR_COLUMNS,
        }
    }

    pub fn apply(self, action: PickerAction) -> Transition {
        if !self.visible && action != PickerAction::Show {
            return Transition::quiet(self);
        }
        debug!(?action, view = ?self.nav.view, month = self.nav.month, year = self.nav.year, "picker action");

        match action {
            PickerAction::Show => Transition::quiet(PickerState {
                visible: true,
                ..self
            }),
            PickerAction::Hide => Transition::quiet(PickerState {
                visible: false,
                ..self
            }),
            PickerAction::Backward => Transition::quiet(PickerState {
                nav: self.nav.backward(),
                ..self
            }),
            PickerAction::Forward => Transition::quiet(PickerState {
                nav: self.nav.forward(),
                ..self
            }),
            PickerAction::ToggleView(view) => Transition::quiet(
                PickerState {
                    nav: self.nav.toggle_view(view),
                    ..self
                }
                .with_default_cursor(),
            ),
            PickerAction::ChooseMonth(month) => Transition::quiet(self.choose_month(month)),
            PickerAction::ChooseYear(year) => Transition::quiet(self.choose_year(year)),
            PickerAction::ChooseCell(cell) => self.choose_cell(cell),
            PickerAction::MoveCursor { dx, dy } => {
                let columns = self.columns() as i32;
                let last = self.cell_count() as i32 - 1;
                let cursor = (self.cursor as i32 + dx + dy * columns).clamp(0, last) as usize;
                Transition::quiet(PickerState { cursor, ..self })
            }
            PickerAction::ActivateCursor => self.activate_cursor(),
        }
    }

    fn choose_month(self, month: u32) -> Self {
        let nav = self.nav.choose_month(month);
        if nav == self.nav {
            return self;
        }
        PickerState { nav, ..self }.with_default_cursor()
    }

    fn choose_year(self, year: i32) -> Self {
        let nav = self.nav.choose_year(year);
        if nav == self.nav {
            return self;
        }
        PickerState { nav, ..self }.with_default_cursor()
    }

    fn choose_cell(self, cell: CalendarCell) -> Transition {
        if cell.disabled {
            return Transition::quiet(PickerState {
                nav: self.nav.step_toward(cell.date.date()),
                ..self
            });
        }
        if !self.bounds.permits(cell.date) {
            debug!(date = %cell.date, "date outside bounds, ignoring");
            return Transition::quiet(self);
        }
        Transition {
            state: PickerState {
                visible: false,
                selected: Some(cell.date),
                ..self
            },
            chosen: Some(cell.date),
        }
    }

    fn activate_cursor(self) -> Transition {
        match self.nav.view {
            PickerView::Days => match self.day_cells().get(self.cursor).copied() {
                Some(cell) => self.choose_cell(cell),
                None => Transition::quiet(self),
            },
            PickerView::Months => {
                let month = self.cursor as u32;
                Transition::quiet(self.choose_month(month))
            }
            PickerView::Years => match self.year_page().get(self.cursor).copied() {
                Some(year) => Transition::quiet(self.choose_year(year)),
                None => Transition::quiet(self),
            },
        }
    }

    /// Puts the cursor on the most relevant cell of the current view.
    fn with_default_cursor(self) -> Self {
        let cursor = match self.nav.view {
            PickerView::Days => {
                let cells = self.day_cells();
                cells
                    .iter()
                    .position(|c| !c.disabled && self.is_active(c.date.date()))
                    .or_else(|| cells.iter().position(|c| !c.disabled))
                    .unwrap_or(0)
            }
            PickerView::Months => self.nav.month as usize,
            PickerView::Years => self
                .year_page()
                .iter()
                .position(|y| *y == self.nav.year)
                .unwrap_or(0),
        };
        PickerState { cursor, ..self }
    }
}
