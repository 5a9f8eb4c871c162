use crate::calc::{DateBounds, PickerAction, PickerState};
use crate::ui::geometry::{contains, place_popup};
use crate::ui::popup::{hit_action, PopupLayout, POPUP_HEIGHT, POPUP_WIDTH};
use chrono::{NaiveDate, NaiveDateTime};
use ratatui::layout::Rect;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Token handed to a trigger when it registers with the overlay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TriggerHandle(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PickerEvent {
    /// The user committed to a date for the trigger that opened the popup.
    DateChosen {
        handle: TriggerHandle,
        date: NaiveDateTime,
    },
    /// A registered trigger was clicked; the host decides whether to open it.
    TriggerClicked(TriggerHandle),
    /// The popup closed without a choice.
    Dismissed(TriggerHandle),
}

/// The single popup shared by every registered trigger.
///
/// Owned by the application shell. Triggers register their on-screen
/// rectangle and keep the returned handle; the registry tracks which trigger
/// currently owns the popup and where the popup is drawn.
#[derive(Debug)]
pub struct OverlayRegistry {
    triggers: BTreeMap<TriggerHandle, Rect>,
    next_id: u64,
    picker: PickerState,
    owner: Option<TriggerHandle>,
    popup: Option<PopupLayout>,
    min_year: i32,
    margin: u16,
}

impl OverlayRegistry {
    pub fn new(today: NaiveDate, min_year: i32, margin: u16) -> Self {
        OverlayRegistry {
            triggers: BTreeMap::new(),
            next_id: 0,
            picker: PickerState::new(today, min_year),
            owner: None,
            popup: None,
            min_year,
            margin,
        }
    }

    pub fn register(&mut self, rect: Rect) -> TriggerHandle {
        let handle = TriggerHandle(self.next_id);
        self.next_id += 1;
        self.triggers.insert(handle, rect);
        debug!(?handle, ?rect, "trigger registered");
        handle
    }

    /// Forgets a trigger; closes the popup if that trigger owned it.
    pub fn unregister(&mut self, handle: TriggerHandle) {
        if self.triggers.remove(&handle).is_none() {
            return;
        }
        debug!(?handle, "trigger unregistered");
        if self.owner == Some(handle) {
            self.close();
        }
    }

    /// Records a trigger's new position. Returns false for unknown handles.
    pub fn relayout(&mut self, handle: TriggerHandle, rect: Rect) -> bool {
        match self.triggers.get_mut(&handle) {
            Some(slot) => {
                *slot = rect;
                true
            }
            None => false,
        }
    }

    pub fn trigger_rect(&self, handle: TriggerHandle) -> Option<Rect> {
        self.triggers.get(&handle).copied()
    }

    pub fn trigger_at(&self, column: u16, row: u16) -> Option<TriggerHandle> {
        self.triggers
            .iter()
            .find(|(_, rect)| contains(**rect, column, row))
            .map(|(handle, _)| *handle)
    }

    pub fn is_open(&self) -> bool {
        self.owner.is_some()
    }

    pub fn owner(&self) -> Option<TriggerHandle> {
        self.owner
    }

    pub fn picker(&self) -> &PickerState {
        &self.picker
    }

    pub fn popup(&self) -> Option<&PopupLayout> {
        self.popup.as_ref()
    }

    /// Shows the popup next to `handle`'s trigger.
    pub fn open(
        &mut self,
        handle: TriggerHandle,
        selected: Option<NaiveDateTime>,
        bounds: DateBounds,
        today: NaiveDate,
        viewport: Rect,
    ) -> bool {
        if !self.triggers.contains_key(&handle) {
            return false;
        }
        self.picker = PickerState::open_at(selected, bounds, today, self.min_year);
        self.owner = Some(handle);
        self.reposition(viewport);
        info!(?handle, ?selected, "picker opened");
        true
    }

    pub fn close(&mut self) -> Option<TriggerHandle> {
        let owner = self.owner.take()?;
        self.picker = self.picker.clone().apply(PickerAction::Hide).state;
        self.popup = None;
        debug!(handle = ?owner, "picker closed");
        Some(owner)
    }

    /// Recomputes the popup position from the owner's current trigger rect.
    /// Call after scrolling or resizing.
    pub fn reposition(&mut self, viewport: Rect) {
        let Some(rect) = self.owner.and_then(|h| self.trigger_rect(h)) else {
            self.popup = None;
            return;
        };
        let area = place_popup(rect, POPUP_WIDTH, POPUP_HEIGHT, viewport, self.margin);
        self.popup = Some(PopupLayout::new(area));
    }

    /// Feeds an action to the open picker.
    pub fn dispatch(&mut self, action: PickerAction) -> Option<PickerEvent> {
        let handle = self.owner?;
        let transition = self.picker.clone().apply(action);
        self.picker = transition.state;

        if let Some(date) = transition.chosen {
            self.owner = None;
            self.popup = None;
            info!(?handle, %date, "date chosen");
            return Some(PickerEvent::DateChosen { handle, date });
        }
        if !self.picker.visible {
            self.owner = None;
            self.popup = None;
            return Some(PickerEvent::Dismissed(handle));
        }
        None
    }

    /// Routes a mouse click. Clicks inside the popup drive the picker; clicks
    /// on a registered trigger are reported back; anything else closes it.
    pub fn on_click(&mut self, column: u16, row: u16) -> Option<PickerEvent> {
        if let Some(layout) = self.popup {
            if contains(layout.area, column, row) {
                let action = layout
                    .hit(&self.picker, column, row)
                    .and_then(|hit| hit_action(&self.picker, hit))?;
                return self.dispatch(action);
            }
        }
        if let Some(handle) = self.trigger_at(column, row) {
            return Some(PickerEvent::TriggerClicked(handle));
        }
        self.close().map(PickerEvent::Dismissed)
    }
}
