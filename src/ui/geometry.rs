use ratatui::layout::Rect;

pub(crate) fn contains(rect: Rect, column: u16, row: u16) -> bool {
    column >= rect.x && column < rect.right() && row >= rect.y && row < rect.bottom()
}

/// Places a popup of `width`×`height` next to `trigger` inside `viewport`.
///
/// Horizontally the popup is flush with the trigger's left edge when it fits,
/// otherwise it is right-aligned with the trigger's right edge. Vertically it
/// goes `margin` rows below the trigger when it fits, otherwise above it.
pub fn place_popup(trigger: Rect, width: u16, height: u16, viewport: Rect, margin: u16) -> Rect {
    let fits_right = trigger.x as u32 + width as u32 <= viewport.right() as u32;
    let x = if fits_right {
        trigger.x
    } else {
        trigger.right().saturating_sub(width).max(viewport.x)
    };

    let below = trigger.bottom() as u32 + margin as u32;
    let fits_beneath = below + height as u32 <= viewport.bottom() as u32;
    let y = if fits_beneath {
        below as u16
    } else {
        trigger
            .y
            .saturating_sub(margin)
            .saturating_sub(height)
            .max(viewport.y)
    };

    Rect::new(x, y, width, height).intersection(viewport)
}
