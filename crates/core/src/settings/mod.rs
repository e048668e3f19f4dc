//! Build settings: parsing the dump and caching it per target

pub mod parser;
pub mod store;

pub use parser::{parse_build_settings, parse_sections, SettingsSection};
pub use store::{SettingsKey, SettingsStore};
