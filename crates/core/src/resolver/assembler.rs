use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use super::pool::{default_workers, run_ordered};
use crate::cancel::CancelToken;
use crate::error::Cancelled;
use crate::macros::MacroExpander;
use crate::settings::SettingsStore;
use crate::test_cases::TestCaseLister;
use crate::types::{Testable, TestableExecutionInfo};

/// Knobs of one resolution pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Upper bound on targets resolved at once, and so on live tool processes
    pub max_workers: usize,
    /// Budget for a single target; its queries are killed when it runs out
    pub target_timeout: Option<Duration>,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            max_workers: default_workers(),
            target_timeout: None,
        }
    }
}

/// Turns testables into [`TestableExecutionInfo`] records using the stores of
/// a session.
///
/// Every target yields a record, in input order. Failures, cancellation and
/// panics are recorded on the target they happened to and never reach its
/// siblings.
pub struct ResolutionAssembler<'a> {
    settings: &'a SettingsStore,
    test_cases: &'a TestCaseLister,
    options: ResolveOptions,
}

impl<'a> ResolutionAssembler<'a> {
    pub fn new(settings: &'a SettingsStore, test_cases: &'a TestCaseLister) -> Self {
        Self {
            settings,
            test_cases,
            options: ResolveOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ResolveOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    /// One record per target, in the order given
    pub fn resolve(
        &self,
        targets: &[Testable],
        build_arguments: &[String],
        sdk: &str,
    ) -> Vec<TestableExecutionInfo> {
        self.resolve_with(targets, build_arguments, sdk, &CancelToken::new())
    }

    /// Like [`resolve`](Self::resolve); firing `cancel` stops every target
    /// still in progress, which then gets an unresolved record.
    pub fn resolve_with(
        &self,
        targets: &[Testable],
        build_arguments: &[String],
        sdk: &str,
        cancel: &CancelToken,
    ) -> Vec<TestableExecutionInfo> {
        tracing::info!(
            "Resolving {} targets for sdk {} with up to {} workers",
            targets.len(),
            sdk,
            self.options.max_workers
        );

        run_ordered(targets, self.options.max_workers, |testable| {
            let token = match self.options.target_timeout {
                Some(timeout) => cancel.child_with_timeout(timeout),
                None => cancel.clone(),
            };
            self.resolve_isolated(testable, build_arguments, sdk, &token)
        })
    }

    /// Resolve a single target. Returns `Err(Cancelled)` when `cancel` fires
    /// before both queries have completed.
    pub fn resolve_target(
        &self,
        testable: &Testable,
        build_arguments: &[String],
        sdk: &str,
        cancel: &CancelToken,
    ) -> Result<TestableExecutionInfo, Cancelled> {
        cancel.check()?;

        let settings = self
            .settings
            .fetch_with(testable, build_arguments, sdk, cancel)?;
        let test_cases = self
            .test_cases
            .list_test_cases_with(testable, &settings, cancel)?;

        let expander = MacroExpander::new(settings.value().map(|settings| &**settings));
        let expanded_arguments = expander.expand(&testable.arguments);
        let expanded_environment = expander.expand(&testable.environment);

        Ok(TestableExecutionInfo::new(
            testable.clone(),
            settings,
            test_cases,
            expanded_arguments,
            expanded_environment,
        ))
    }

    fn resolve_isolated(
        &self,
        testable: &Testable,
        build_arguments: &[String],
        sdk: &str,
        cancel: &CancelToken,
    ) -> TestableExecutionInfo {
        let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
            self.resolve_target(testable, build_arguments, sdk, cancel)
        }));

        let reason = match attempt {
            Ok(Ok(info)) => return info,
            Ok(Err(Cancelled)) => format!("resolution of {} cancelled", testable.target),
            Err(payload) => format!(
                "resolution of {} panicked: {}",
                testable.target,
                panic_message(payload.as_ref())
            ),
        };

        tracing::warn!("{}", reason);
        TestableExecutionInfo::unresolved(testable.clone(), &reason)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}
