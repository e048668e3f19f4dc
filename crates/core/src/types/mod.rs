pub mod build_settings;
pub mod execution_info;
pub mod outcome;
pub mod testable;

// Re-export commonly used types
pub use build_settings::BuildSettings;
pub use execution_info::TestableExecutionInfo;
pub use outcome::{FetchOutcome, SettingsFetchOutcome, TestCasesFetchOutcome};
pub use testable::{Testable, TestableId};
