use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeStruct, Serializer};

use super::{BuildSettings, SettingsFetchOutcome, TestCasesFetchOutcome, Testable};

/// Everything needed to launch one test bundle: its build settings, the test
/// cases it contains and its launch arguments/environment with all macros
/// expanded.
///
/// Built once per target by the resolver and never mutated afterwards. Query
/// failures are kept alongside the other fields instead of aborting resolution,
/// so a record always exists for every requested target.
#[derive(Debug, Clone, PartialEq)]
pub struct TestableExecutionInfo {
    testable: Testable,
    build_settings: SettingsFetchOutcome,
    test_cases: TestCasesFetchOutcome,
    expanded_arguments: Vec<String>,
    expanded_environment: IndexMap<String, String>,
}

impl TestableExecutionInfo {
    pub fn new(
        testable: Testable,
        build_settings: SettingsFetchOutcome,
        test_cases: TestCasesFetchOutcome,
        expanded_arguments: Vec<String>,
        expanded_environment: IndexMap<String, String>,
    ) -> Self {
        Self {
            testable,
            build_settings,
            test_cases,
            expanded_arguments,
            expanded_environment,
        }
    }

    /// Record for a target whose resolution never completed: both fetches carry
    /// `reason` and the launch configuration is passed through unexpanded.
    pub fn unresolved(testable: Testable, reason: &str) -> Self {
        let expanded_arguments = testable.arguments.clone();
        let expanded_environment = testable.environment.clone();
        Self {
            testable,
            build_settings: SettingsFetchOutcome::failed(reason),
            test_cases: TestCasesFetchOutcome::failed(reason),
            expanded_arguments,
            expanded_environment,
        }
    }

    pub fn testable(&self) -> &Testable {
        &self.testable
    }

    pub fn build_settings_outcome(&self) -> &SettingsFetchOutcome {
        &self.build_settings
    }

    pub fn build_settings(&self) -> Option<&BuildSettings> {
        self.build_settings.value().map(|settings| &**settings)
    }

    pub fn build_settings_error(&self) -> Option<&str> {
        self.build_settings.error()
    }

    pub fn test_cases_outcome(&self) -> &TestCasesFetchOutcome {
        &self.test_cases
    }

    pub fn test_cases(&self) -> Option<&[String]> {
        self.test_cases.value().map(Vec::as_slice)
    }

    pub fn test_cases_error(&self) -> Option<&str> {
        self.test_cases.error()
    }

    pub fn expanded_arguments(&self) -> &[String] {
        &self.expanded_arguments
    }

    pub fn expanded_environment(&self) -> &IndexMap<String, String> {
        &self.expanded_environment
    }

    /// True when both fetches succeeded
    pub fn is_complete(&self) -> bool {
        self.build_settings.is_fetched() && self.test_cases.is_fetched()
    }
}

impl Serialize for TestableExecutionInfo {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("TestableExecutionInfo", 7)?;
        state.serialize_field("testable", &self.testable)?;
        state.serialize_field("build_settings", &self.build_settings())?;
        state.serialize_field("build_settings_error", &self.build_settings_error())?;
        state.serialize_field("test_cases", &self.test_cases())?;
        state.serialize_field("test_cases_error", &self.test_cases_error())?;
        state.serialize_field("expanded_arguments", &self.expanded_arguments)?;
        state.serialize_field("expanded_environment", &self.expanded_environment)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FetchOutcome;
    use std::sync::Arc;

    #[test]
    fn test_unresolved_passes_launch_configuration_through() {
        let testable = Testable::new("FooTests", "/src/Foo.xcodeproj")
            .with_arguments(["$(SRCROOT)/data"])
            .with_env("HOME_DIR", "$(HOME)");

        let info = TestableExecutionInfo::unresolved(testable, "resolution cancelled");

        assert_eq!(info.build_settings_error(), Some("resolution cancelled"));
        assert_eq!(info.test_cases_error(), Some("resolution cancelled"));
        assert_eq!(info.expanded_arguments(), ["$(SRCROOT)/data".to_string()]);
        assert_eq!(info.expanded_environment()["HOME_DIR"], "$(HOME)");
        assert!(!info.is_complete());
    }

    #[test]
    fn test_serializes_values_and_errors_side_by_side() {
        let settings: BuildSettings = [("SDK_NAME", "iphonesimulator17.0")].into_iter().collect();
        let info = TestableExecutionInfo::new(
            Testable::new("FooTests", "/src/Foo.xcodeproj"),
            FetchOutcome::Fetched(Arc::new(settings)),
            FetchOutcome::failed("otest-query failed"),
            vec!["-Verbose".to_string()],
            IndexMap::new(),
        );

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["build_settings"]["SDK_NAME"], "iphonesimulator17.0");
        assert!(json["build_settings_error"].is_null());
        assert!(json["test_cases"].is_null());
        assert_eq!(json["test_cases_error"], "otest-query failed");
        assert_eq!(json["expanded_arguments"][0], "-Verbose");
    }
}
