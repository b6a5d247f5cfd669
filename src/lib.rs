//! Shapes OpenStreetMap extracts into JSON lines for a document store, reconciling Dublin
//! addresses against postal district and satellite town tables.

pub mod audit;
pub mod config;
pub mod convert;
pub mod data;
pub mod errors;
pub mod etl;
pub mod html;
pub mod loader;
pub mod shape;

pub use crate::convert::{read_records, JsonLinesWriter, MapConverter, OutputStyle};
pub use crate::data::{RawElement, ReferenceTables, ShapedRecord};
pub use crate::etl::parse_osm::ElementReader;
pub use crate::shape::shape_element;
