use std::path::PathBuf;
use std::time::Duration;

use super::{TestCaseQuery, TestCaseRequest, ToolCommand};
use crate::{cancel::CancelToken, error::QueryError};

/// Lists the test cases of a bundle with `otest-query`.
///
/// Logic test bundles are loaded directly by the `otest-query` tool. Application
/// test bundles can only be loaded inside their host app, so the host is
/// launched with the query library injected and told which bundle to inspect.
#[derive(Debug, Clone)]
pub struct OtestQuery {
    program: String,
    injected_library: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl OtestQuery {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            injected_library: None,
            timeout: None,
        }
    }

    /// Library injected into test hosts for application test queries
    pub fn with_injected_library(mut self, library: Option<PathBuf>) -> Self {
        self.injected_library = library;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build_command(&self, request: &TestCaseRequest) -> Result<ToolCommand, QueryError> {
        let bundle = request.bundle_path.to_string_lossy();
        let products = request.built_products_dir.to_string_lossy();

        let command = match &request.test_host {
            None => ToolCommand::new(self.program.as_str()).arg(bundle.as_ref()),
            Some(host) => {
                let library = self.injected_library.as_ref().ok_or_else(|| {
                    QueryError::Unsupported(format!(
                        "cannot list test cases of application test bundle {}: no otest-query library configured",
                        request.bundle_path.display()
                    ))
                })?;
                ToolCommand::new(host.to_string_lossy())
                    .with_env("DYLD_INSERT_LIBRARIES", library.to_string_lossy())
                    .with_env("OtestQueryBundlePath", bundle.as_ref())
            }
        };

        Ok(command
            .with_env("DYLD_FRAMEWORK_PATH", products.as_ref())
            .with_env("DYLD_LIBRARY_PATH", products.as_ref())
            .with_timeout(self.timeout))
    }
}

impl Default for OtestQuery {
    fn default() -> Self {
        Self::new("otest-query")
    }
}

impl TestCaseQuery for OtestQuery {
    fn list_test_cases(
        &self,
        request: &TestCaseRequest,
        cancel: &CancelToken,
    ) -> Result<String, QueryError> {
        self.build_command(request)?.run(cancel)
    }

    fn name(&self) -> &str {
        &self.program
    }
}
