//! Data model for the workbench engine.
//!
//! Editors, queries, and schema-browser tables, plus the unsaved overlay
//! merged over an editor to produce its up-to-date view.

mod editor;
mod query;
mod table;

pub use editor::{QueryEditor, UnsavedQueryEditor};
pub use query::{decode_result_set, CellValue, ColumnInfo, Query, QueryStatus, ResultSet};
pub use table::Table;
