use std::sync::Arc;

use super::parser::parse_build_settings;
use crate::cache::InFlightCache;
use crate::cancel::CancelToken;
use crate::error::{Cancelled, QueryError};
use crate::query::{BuildSettingsQuery, SettingsRequest};
use crate::types::{FetchOutcome, SettingsFetchOutcome, Testable, TestableId};

/// Cache key of a build settings dump
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SettingsKey {
    pub testable: TestableId,
    pub build_arguments: Vec<String>,
    pub sdk: String,
}

/// Fetches build settings through a [`BuildSettingsQuery`] and memoizes the
/// outcome per (target, build arguments, sdk) for the rest of the session.
pub struct SettingsStore {
    query: Arc<dyn BuildSettingsQuery>,
    cache: InFlightCache<SettingsKey, SettingsFetchOutcome>,
}

impl SettingsStore {
    pub fn new(query: Arc<dyn BuildSettingsQuery>) -> Self {
        Self {
            query,
            cache: InFlightCache::new(),
        }
    }

    /// Build settings of `testable`, queried at most once per key
    pub fn fetch(
        &self,
        testable: &Testable,
        build_arguments: &[String],
        sdk: &str,
    ) -> SettingsFetchOutcome {
        self.fetch_with(testable, build_arguments, sdk, &CancelToken::new())
            .unwrap_or_else(|cancelled| FetchOutcome::failed(cancelled.to_string()))
    }

    /// Like [`fetch`](Self::fetch), but gives up when `cancel` fires.
    ///
    /// A cancelled attempt leaves no cache entry behind; any requester waiting
    /// on the same key runs its own query.
    pub fn fetch_with(
        &self,
        testable: &Testable,
        build_arguments: &[String],
        sdk: &str,
        cancel: &CancelToken,
    ) -> Result<SettingsFetchOutcome, Cancelled> {
        if sdk.trim().is_empty() {
            return Ok(FetchOutcome::failed(format!(
                "cannot fetch build settings for {}: no SDK given",
                testable.target
            )));
        }

        let key = SettingsKey {
            testable: testable.id(),
            build_arguments: build_arguments.to_vec(),
            sdk: sdk.to_string(),
        };

        if let Some(outcome) = self.cache.get(&key) {
            tracing::debug!("Build settings cache hit for {}", key.testable);
            return Ok(outcome);
        }

        let request = SettingsRequest {
            testable,
            build_arguments,
            sdk,
        };
        self.cache
            .get_or_try_insert_with(key, || self.query_settings(&request, cancel))
    }

    /// Number of external queries started by this store
    pub fn queries_started(&self) -> usize {
        self.cache.computations()
    }

    /// Drop every cached outcome
    pub fn clear(&self) {
        self.cache.clear();
    }

    fn query_settings(
        &self,
        request: &SettingsRequest<'_>,
        cancel: &CancelToken,
    ) -> Result<SettingsFetchOutcome, Cancelled> {
        cancel.check()?;
        let target = &request.testable.target;
        tracing::debug!(
            "Querying build settings for {} with {} (sdk {})",
            target,
            self.query.name(),
            request.sdk
        );

        let outcome = match self.query.show_build_settings(request, cancel) {
            Ok(output) => match parse_build_settings(&output, target) {
                Ok(settings) => {
                    tracing::debug!("Fetched {} build settings for {}", settings.len(), target);
                    FetchOutcome::Fetched(Arc::new(settings))
                }
                Err(e) => FetchOutcome::failed(format!(
                    "unable to parse build settings for {target}: {e}"
                )),
            },
            Err(QueryError::Cancelled) => return Err(Cancelled),
            Err(e) => FetchOutcome::failed(format!(
                "unable to fetch build settings for {target}: {e}"
            )),
        };

        if let Some(error) = outcome.error() {
            tracing::warn!("{}", error);
        }
        Ok(outcome)
    }
}
