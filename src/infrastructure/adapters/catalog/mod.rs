//! Character Catalog Adapter - JSON 人物名录

mod json_catalog;

pub use json_catalog::JsonCharacterCatalog;
