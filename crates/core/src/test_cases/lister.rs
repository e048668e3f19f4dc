use std::path::PathBuf;
use std::sync::Arc;

use super::parser::parse_test_cases;
use crate::cache::InFlightCache;
use crate::cancel::CancelToken;
use crate::error::{Cancelled, QueryError};
use crate::macros::MacroExpander;
use crate::query::{TestCaseQuery, TestCaseRequest};
use crate::types::build_settings::{BUILT_PRODUCTS_DIR, TEST_HOST};
use crate::types::{
    BuildSettings, FetchOutcome, SettingsFetchOutcome, TestCasesFetchOutcome, Testable,
    TestableId,
};

/// Prefix of the error recorded when the query is skipped because the build
/// settings of the target are unavailable
pub const SKIPPED_WITHOUT_SETTINGS: &str = "test cases not queried: build settings unavailable";

/// Lists the test cases of a target's compiled bundle through a
/// [`TestCaseQuery`], memoized per (target, bundle path) for the session.
pub struct TestCaseLister {
    query: Arc<dyn TestCaseQuery>,
    cache: InFlightCache<(TestableId, PathBuf), TestCasesFetchOutcome>,
}

impl TestCaseLister {
    pub fn new(query: Arc<dyn TestCaseQuery>) -> Self {
        Self {
            query,
            cache: InFlightCache::new(),
        }
    }

    /// Test cases of `testable`, using the bundle location found in `settings`
    pub fn list_test_cases(
        &self,
        testable: &Testable,
        settings: &SettingsFetchOutcome,
    ) -> TestCasesFetchOutcome {
        self.list_test_cases_with(testable, settings, &CancelToken::new())
            .unwrap_or_else(|cancelled| FetchOutcome::failed(cancelled.to_string()))
    }

    /// Like [`list_test_cases`](Self::list_test_cases), but gives up when
    /// `cancel` fires. Cancelled attempts are not cached.
    pub fn list_test_cases_with(
        &self,
        testable: &Testable,
        settings: &SettingsFetchOutcome,
        cancel: &CancelToken,
    ) -> Result<TestCasesFetchOutcome, Cancelled> {
        let settings = match settings {
            FetchOutcome::Fetched(settings) => settings,
            FetchOutcome::Failed(error) => {
                tracing::debug!("Skipping test case query for {}", testable.target);
                return Ok(FetchOutcome::failed(format!(
                    "{SKIPPED_WITHOUT_SETTINGS}: {error}"
                )));
            }
        };

        let request = match build_request(testable, settings) {
            Ok(request) => request,
            Err(error) => return Ok(FetchOutcome::failed(error)),
        };

        let key = (testable.id(), request.bundle_path.clone());
        if let Some(outcome) = self.cache.get(&key) {
            tracing::debug!("Test case cache hit for {}", request.bundle_path.display());
            return Ok(outcome);
        }

        self.cache
            .get_or_try_insert_with(key, || self.query_test_cases(testable, &request, cancel))
    }

    /// Number of external queries started by this lister
    pub fn queries_started(&self) -> usize {
        self.cache.computations()
    }

    /// Drop every cached outcome
    pub fn clear(&self) {
        self.cache.clear();
    }

    fn query_test_cases(
        &self,
        testable: &Testable,
        request: &TestCaseRequest,
        cancel: &CancelToken,
    ) -> Result<TestCasesFetchOutcome, Cancelled> {
        cancel.check()?;
        tracing::debug!(
            "Querying test cases of {} with {}{}",
            request.bundle_path.display(),
            self.query.name(),
            if request.is_application_test() { " (application test)" } else { "" }
        );

        let outcome = match self.query.list_test_cases(request, cancel) {
            Ok(output) => match parse_test_cases(&output) {
                Ok(test_cases) => {
                    tracing::debug!("Found {} test cases in {}", test_cases.len(), testable.target);
                    FetchOutcome::Fetched(test_cases)
                }
                Err(e) => FetchOutcome::failed(format!(
                    "unable to parse test cases of {}: {e}",
                    testable.target
                )),
            },
            Err(QueryError::Cancelled) => return Err(Cancelled),
            Err(e) => FetchOutcome::failed(format!(
                "unable to query test cases of {}: {e}",
                testable.target
            )),
        };

        if let Some(error) = outcome.error() {
            tracing::warn!("{}", error);
        }
        Ok(outcome)
    }
}

/// Locate the bundle of `testable` from its build settings
fn build_request(testable: &Testable, settings: &BuildSettings) -> Result<TestCaseRequest, String> {
    let expander = MacroExpander::new(Some(settings));

    let built_products_dir = settings.non_empty(BUILT_PRODUCTS_DIR).ok_or_else(|| {
        format!(
            "cannot locate test bundle of {}: BUILT_PRODUCTS_DIR is not set",
            testable.target
        )
    })?;
    let product_name = settings
        .full_product_name()
        .or(testable.executable.as_deref())
        .ok_or_else(|| {
            format!(
                "cannot locate test bundle of {}: FULL_PRODUCT_NAME is not set",
                testable.target
            )
        })?;

    let built_products_dir = PathBuf::from(expander.expand(built_products_dir));
    let bundle_path = built_products_dir.join(expander.expand(product_name));
    let test_host = settings
        .non_empty(TEST_HOST)
        .map(|host| PathBuf::from(expander.expand(host)));

    Ok(TestCaseRequest {
        bundle_path,
        built_products_dir,
        sdk: settings.sdk_name().map(str::to_string),
        test_host,
    })
}
