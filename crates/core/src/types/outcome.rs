use std::sync::Arc;

use super::BuildSettings;

/// Result of one external fetch: either the fetched value or the recorded
/// failure message, never both
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome<T> {
    Fetched(T),
    Failed(String),
}

impl<T> FetchOutcome<T> {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Fetched(value) => Some(value),
            Self::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Fetched(_) => None,
            Self::Failed(message) => Some(message),
        }
    }

    pub fn is_fetched(&self) -> bool {
        matches!(self, Self::Fetched(_))
    }
}

/// Outcome of the build settings dump for a target
pub type SettingsFetchOutcome = FetchOutcome<Arc<BuildSettings>>;

/// Outcome of the test case query for a target's bundle
pub type TestCasesFetchOutcome = FetchOutcome<Vec<String>>;
