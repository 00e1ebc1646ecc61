//! Notes - the capture side's storage collaborator
//!
//! - `model` - Note and Category, plus category parsing of captured text
//! - `storage` - SQLite-backed NoteStore
//! - `grouping` - day grouping for the note list
//! - `capture` - StoreSink, the CaptureSink used by the overlay

mod capture;
mod grouping;
mod model;
mod storage;

pub use capture::{persist, StoreSink};
pub use grouping::{day_label, group_by_day, group_by_day_in, DayGroup};
pub use model::{parse_category, Category, Note};
pub use storage::NoteStore;
