pub mod bounds;
pub mod grid;
pub mod navigator;
pub mod picker;

pub use bounds::DateBounds;
pub use navigator::PickerView;
pub use picker::{PickerAction, PickerState};
