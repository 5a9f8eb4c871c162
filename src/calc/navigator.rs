use crate::calc::grid::YEAR_CELLS;
use chrono::{Datelike, NaiveDate};

/// Earliest year the picker navigates to.
pub const MIN_YEAR: i32 = 1895;

/// Latest year the picker navigates to.
pub const MAX_YEAR: i32 = 9999;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PickerView {
    #[default]
    Days,
    Months,
    Years,
}

/// Which page of which view the picker shows. `month` is zero-based.
///
/// All transitions return a new value; the previous one is left untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Navigator {
    pub view: PickerView,
    pub month: u32,
    pub year: i32,
    pub min_year: i32,
}

impl Navigator {
    pub fn new(month: u32, year: i32, min_year: i32) -> Self {
        Navigator {
            view: PickerView::Days,
            month: month.min(11),
            year: year.clamp(min_year, MAX_YEAR),
            min_year,
        }
    }

    /// Navigator showing the month that contains `date`.
    pub fn at(date: NaiveDate, min_year: i32) -> Self {
        Self::new(date.month0(), date.year(), min_year)
    }

    pub fn backward(self) -> Self {
        let mut next = self;
        match self.view {
            PickerView::Days => {
                if self.month > 0 {
                    next.month -= 1;
                } else if self.year - 1 >= self.min_year {
                    next.year -= 1;
                    next.month = 11;
                } else {
                    next.month = 0;
                }
            }
            PickerView::Months => next.year = (self.year - 1).max(self.min_year),
            PickerView::Years => next.year = (self.year - YEAR_CELLS).max(self.min_year),
        }
        next
    }

    pub fn forward(self) -> Self {
        let mut next = self;
        match self.view {
            PickerView::Days => {
                if self.month < 11 {
                    next.month += 1;
                } else if self.year < MAX_YEAR {
                    next.year += 1;
                    next.month = 0;
                }
            }
            PickerView::Months => next.year = (self.year + 1).min(MAX_YEAR),
            PickerView::Years => next.year = (self.year + YEAR_CELLS).min(MAX_YEAR),
        }
        next
    }

    pub fn toggle_view(self, view: PickerView) -> Self {
        Navigator { view, ..self }
    }

    pub fn choose_month(self, month: u32) -> Self {
        if month > 11 {
            return self;
        }
        Navigator {
            view: PickerView::Days,
            month,
            ..self
        }
    }

    /// Picks a year from the Years page; years below the floor are not selectable.
    pub fn choose_year(self, year: i32) -> Self {
        if !self.is_year_selectable(year) {
            return self;
        }
        Navigator {
            view: PickerView::Months,
            year,
            ..self
        }
    }

    pub fn is_year_selectable(&self, year: i32) -> bool {
        (self.min_year..=MAX_YEAR).contains(&year)
    }

    /// Steps one page toward an out-of-month day cell.
    pub fn step_toward(self, date: NaiveDate) -> Self {
        let shown = (self.year, self.month);
        let target = (date.year(), date.month0());
        if target < shown {
            self.backward()
        } else if target > shown {
            self.forward()
        } else {
            self
        }
    }
}
