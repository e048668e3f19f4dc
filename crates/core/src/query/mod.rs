//! Narrow interfaces to the external tools the resolver depends on
//!
//! The resolver never talks to `xcodebuild` or `otest-query` directly; it goes
//! through [`BuildSettingsQuery`] and [`TestCaseQuery`], which return the raw
//! tool output. Parsing that output is the resolver's job.

use std::path::PathBuf;

use crate::{cancel::CancelToken, error::QueryError, types::Testable};

pub mod otest_query;
pub mod tool_command;
pub mod xcodebuild;

pub use otest_query::OtestQuery;
pub use tool_command::{ToolCommand, shell_quote};
pub use xcodebuild::XcodebuildSettingsQuery;

/// Parameters of one build settings dump
#[derive(Debug, Clone, Copy)]
pub struct SettingsRequest<'a> {
    pub testable: &'a Testable,
    pub build_arguments: &'a [String],
    pub sdk: &'a str,
}

/// Parameters of one test case listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCaseRequest {
    /// Path of the compiled test bundle
    pub bundle_path: PathBuf,
    /// Directory the bundle and its dependencies were built into
    pub built_products_dir: PathBuf,
    /// SDK the bundle was built against, as reported by the build settings
    pub sdk: Option<String>,
    /// Host application for application tests; `None` for logic tests
    pub test_host: Option<PathBuf>,
}

impl TestCaseRequest {
    pub fn is_application_test(&self) -> bool {
        self.test_host.is_some()
    }
}

/// Source of raw build settings output (`xcodebuild -showBuildSettings`)
pub trait BuildSettingsQuery: Send + Sync {
    /// Run the query and return its raw textual output
    fn show_build_settings(
        &self,
        request: &SettingsRequest<'_>,
        cancel: &CancelToken,
    ) -> Result<String, QueryError>;

    /// Name of the tool, used in log messages
    fn name(&self) -> &str;
}

/// Source of raw test case listings for a compiled bundle
pub trait TestCaseQuery: Send + Sync {
    /// Run the query and return its raw textual output
    fn list_test_cases(
        &self,
        request: &TestCaseRequest,
        cancel: &CancelToken,
    ) -> Result<String, QueryError>;

    /// Name of the tool, used in log messages
    fn name(&self) -> &str;
}
