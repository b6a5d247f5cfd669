pub mod osm;
pub mod record;
pub mod reference;

pub use self::osm::{Child, ElementKind, RawElement};
pub use self::record::{Created, PrimitiveType, ShapedRecord};
pub use self::reference::ReferenceTables;
