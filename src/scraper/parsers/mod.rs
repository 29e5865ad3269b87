//! Parsers for the catalog, the two odds payload generations and
//! in-page navigation links.

pub mod catalog;
pub mod flat;
pub mod grouped;
pub mod json;
pub mod links;
pub mod odds;

pub use catalog::{CatalogParser, GroupDescriptor, SportGroup};
pub use flat::FlatDocument;
pub use grouped::GroupedDocument;
pub use links::{find_sport_link, SportLink};
pub use odds::OddsFields;
