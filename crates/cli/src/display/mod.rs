pub mod formatter;

pub use formatter::{format_record, format_settings, format_summary};
