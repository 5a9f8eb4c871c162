pub mod form;
pub mod persistence;
pub mod settings;

pub use form::FormData;
pub use persistence::Persistable;
pub use settings::{FieldConfig, PickerSettings};
