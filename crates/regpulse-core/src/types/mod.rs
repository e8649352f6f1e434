//! Record data model and collection aliases.
//! Families, regions, records, immutable record tables, and grouping keys.

pub mod collections;
pub mod family;
pub mod key;
pub mod record;
pub mod table;

pub use collections::{FxHashMap, FxHashSet};
pub use family::Family;
pub use key::{KeyField, KeyValue};
pub use record::{Record, Region};
pub use table::{Dataset, RecordTable};
