use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A test target as described by the project model: one buildable bundle of tests
/// together with the raw arguments and environment it should be launched with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Testable {
    /// Name of the build target (e.g. `FooTests`)
    pub target: String,
    /// Path to the `.xcodeproj` that owns the target
    pub project_path: PathBuf,
    /// File name of the compiled bundle (e.g. `FooTests.xctest`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable: Option<String>,
    /// Launch arguments, possibly containing `$(NAME)` references
    #[serde(default)]
    pub arguments: Vec<String>,
    /// Launch environment, values possibly containing `$(NAME)` references
    #[serde(default)]
    pub environment: IndexMap<String, String>,
}

impl Testable {
    pub fn new(target: impl Into<String>, project_path: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            project_path: project_path.into(),
            executable: None,
            arguments: Vec::new(),
            environment: IndexMap::new(),
        }
    }

    pub fn with_executable(mut self, executable: impl Into<String>) -> Self {
        self.executable = Some(executable.into());
        self
    }

    pub fn with_arguments<I, S>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments = arguments.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }

    /// Stable identity used to key the session caches
    pub fn id(&self) -> TestableId {
        TestableId {
            project_path: self.project_path.clone(),
            target: self.target.clone(),
        }
    }
}

/// Identity of a testable: the project it lives in plus its target name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TestableId {
    pub project_path: PathBuf,
    pub target: String,
}

impl fmt::Display for TestableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.target, self.project_path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_ignores_launch_configuration() {
        let plain = Testable::new("FooTests", "/src/Foo.xcodeproj");
        let configured = plain
            .clone()
            .with_arguments(["-AppleLanguages", "(en)"])
            .with_env("TZ", "UTC");

        assert_eq!(plain.id(), configured.id());
        assert_ne!(plain.id(), Testable::new("BarTests", "/src/Foo.xcodeproj").id());
    }

    #[test]
    fn test_deserialize_manifest_entry() {
        let json = r#"{
            "target": "FooTests",
            "project_path": "/src/Foo.xcodeproj",
            "executable": "FooTests.xctest",
            "arguments": ["-Verbose", "$(SRCROOT)/fixtures"],
            "environment": {"B": "2", "A": "1"}
        }"#;

        let testable: Testable = serde_json::from_str(json).unwrap();
        assert_eq!(testable.executable.as_deref(), Some("FooTests.xctest"));
        assert_eq!(testable.arguments.len(), 2);
        // Environment keeps manifest order
        let keys: Vec<_> = testable.environment.keys().cloned().collect();
        assert_eq!(keys, vec!["B".to_string(), "A".to_string()]);
    }

    #[test]
    fn test_deserialize_minimal_entry() {
        let testable: Testable =
            serde_json::from_str(r#"{"target": "T", "project_path": "P.xcodeproj"}"#).unwrap();
        assert!(testable.arguments.is_empty());
        assert!(testable.environment.is_empty());
        assert_eq!(testable.id().to_string(), "T (P.xcodeproj)");
    }
}
