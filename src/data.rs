//! Raw elements as they appear in the .osm file, and the flat rows they are shaped into.

pub mod osm;
pub mod table;

pub use self::osm::{ElementKind, RawElement, RawTag};
pub use self::table::{MemberRecord, PrimaryRecord, ShapedRecord, TagRecord};
