//! Core library for Asset Grid.
//! Discovers typed asset records under a project folder and edits them as a sortable,
//! resizable spreadsheet: one row per record, one column per schema field.

mod asset_path;
pub mod catalog;
pub mod config;
pub mod error;
pub mod grid;
mod gui;
pub mod layout;
pub mod namer;
pub mod object_set;
pub mod prefs;
mod record;
pub mod schema;
pub mod session;
pub mod sort;
pub mod statics;
pub mod store;
mod value;

pub use asset_path::AssetPath;
pub use gui::run_gui;
pub use record::{AssetEncoding, Record};
pub use session::{Session, Stats};
pub use value::{AssetNumber, AssetValue, FieldValue, Rgba, ValueKind};
