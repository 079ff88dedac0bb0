//! Plain data model shared by every transform stage.
//!
//! Nothing in this crate touches the filesystem: stages read and write
//! [`Table`]s, and the storage layer in the main crate maps them to columnar files.

mod kinds;
mod table;
mod value;

pub use kinds::{CanonicalRule, SourceKind};
pub use table::Table;
pub use value::{ColumnType, Value};
