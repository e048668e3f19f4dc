use std::sync::Arc;

use super::assembler::{ResolutionAssembler, ResolveOptions};
use crate::cancel::CancelToken;
use crate::config::ResolverConfig;
use crate::query::{BuildSettingsQuery, TestCaseQuery};
use crate::settings::SettingsStore;
use crate::test_cases::TestCaseLister;
use crate::types::{Testable, TestableExecutionInfo};

/// Owns the caches of one resolution session.
///
/// Outcomes are shared by every assembler handed out by the session and are
/// dropped with it. Nothing is persisted.
pub struct ResolutionSession {
    settings: SettingsStore,
    test_cases: TestCaseLister,
    options: ResolveOptions,
}

impl ResolutionSession {
    pub fn new(
        settings_query: Arc<dyn BuildSettingsQuery>,
        test_case_query: Arc<dyn TestCaseQuery>,
    ) -> Self {
        Self {
            settings: SettingsStore::new(settings_query),
            test_cases: TestCaseLister::new(test_case_query),
            options: ResolveOptions::default(),
        }
    }

    /// Session backed by the external tools named in `config`
    pub fn from_config(config: &ResolverConfig) -> Self {
        tracing::debug!(
            "Starting resolution session (xcodebuild: {}, otest-query: {})",
            config.xcodebuild_program(),
            config.otest_query_program()
        );
        Self::new(
            Arc::new(config.settings_query()),
            Arc::new(config.test_case_query()),
        )
        .with_options(config.resolve_options())
    }

    pub fn with_options(mut self, options: ResolveOptions) -> Self {
        self.options = options;
        self
    }

    pub fn assembler(&self) -> ResolutionAssembler<'_> {
        ResolutionAssembler::new(&self.settings, &self.test_cases).with_options(self.options.clone())
    }

    pub fn resolve(
        &self,
        targets: &[Testable],
        build_arguments: &[String],
        sdk: &str,
    ) -> Vec<TestableExecutionInfo> {
        self.assembler().resolve(targets, build_arguments, sdk)
    }

    pub fn resolve_with(
        &self,
        targets: &[Testable],
        build_arguments: &[String],
        sdk: &str,
        cancel: &CancelToken,
    ) -> Vec<TestableExecutionInfo> {
        self.assembler()
            .resolve_with(targets, build_arguments, sdk, cancel)
    }

    pub fn settings_store(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn test_case_lister(&self) -> &TestCaseLister {
        &self.test_cases
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }
}
