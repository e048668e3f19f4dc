//! Test case discovery for compiled test bundles

pub mod lister;
pub mod parser;

pub use lister::{TestCaseLister, SKIPPED_WITHOUT_SETTINGS};
pub use parser::{is_test_case_id, parse_test_cases};
