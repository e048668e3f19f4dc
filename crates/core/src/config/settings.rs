use crate::error::{Error, Result};
use crate::query::{OtestQuery, XcodebuildSettingsQuery};
use crate::resolver::{ResolveOptions, default_workers};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE_NAMES: [&str; 2] = [".xcresolve.json", "xcresolve.json"];
pub const DEFAULT_XCODEBUILD: &str = "xcodebuild";
pub const DEFAULT_OTEST_QUERY: &str = "otest-query";

/// Resolver settings read from `.xcresolve.json`. Every field is optional;
/// accessors fill in the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ResolverConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xcodebuild: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otest_query: Option<String>,
    /// Library injected into test hosts to list application tests
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otest_query_lib: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_workers: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_timeout_secs: Option<u64>,
}

impl ResolverConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&contents)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn find_config_file(start_path: &Path) -> Option<PathBuf> {
        let mut current = start_path;

        loop {
            for name in CONFIG_FILE_NAMES {
                let config_path = current.join(name);
                if config_path.exists() {
                    return Some(config_path);
                }
            }

            current = current.parent()?;
        }
    }

    /// Config found from `start_path` upwards, or the defaults when there is none
    pub fn load(start_path: &Path) -> Result<Self> {
        match Self::find_config_file(start_path) {
            Some(path) => {
                tracing::debug!("Loading config from {}", path.display());
                Self::load_from_file(&path)
            }
            None => {
                tracing::debug!("No config file above {}, using defaults", start_path.display());
                Ok(Self::default())
            }
        }
    }

    /// Fields set in `other` replace the ones in `self`
    pub fn merge(mut self, other: ResolverConfig) -> Self {
        self.xcodebuild = other.xcodebuild.or(self.xcodebuild);
        self.otest_query = other.otest_query.or(self.otest_query);
        self.otest_query_lib = other.otest_query_lib.or(self.otest_query_lib);
        self.max_workers = other.max_workers.or(self.max_workers);
        self.query_timeout_secs = other.query_timeout_secs.or(self.query_timeout_secs);
        self.target_timeout_secs = other.target_timeout_secs.or(self.target_timeout_secs);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_workers == Some(0) {
            return Err(Error::ConfigError("max_workers must be at least 1".to_string()));
        }
        for (name, program) in [("xcodebuild", &self.xcodebuild), ("otest_query", &self.otest_query)] {
            if program.as_deref().is_some_and(|p| p.trim().is_empty()) {
                return Err(Error::ConfigError(format!("{name} must not be empty")));
            }
        }
        Ok(())
    }

    pub fn xcodebuild_program(&self) -> &str {
        self.xcodebuild.as_deref().unwrap_or(DEFAULT_XCODEBUILD)
    }

    pub fn otest_query_program(&self) -> &str {
        self.otest_query.as_deref().unwrap_or(DEFAULT_OTEST_QUERY)
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers.filter(|&n| n > 0).unwrap_or_else(default_workers)
    }

    pub fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout_secs.map(Duration::from_secs)
    }

    pub fn target_timeout(&self) -> Option<Duration> {
        self.target_timeout_secs.map(Duration::from_secs)
    }

    pub fn settings_query(&self) -> XcodebuildSettingsQuery {
        XcodebuildSettingsQuery::new(self.xcodebuild_program()).with_timeout(self.query_timeout())
    }

    pub fn test_case_query(&self) -> OtestQuery {
        OtestQuery::new(self.otest_query_program())
            .with_injected_library(self.otest_query_lib.clone())
            .with_timeout(self.query_timeout())
    }

    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            max_workers: self.max_workers(),
            target_timeout: self.target_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_serialization() {
        let config = ResolverConfig {
            xcodebuild: Some("/usr/bin/xcodebuild".to_string()),
            otest_query_lib: Some(PathBuf::from("/opt/lib/otest-query-ios.dylib")),
            max_workers: Some(4),
            query_timeout_secs: Some(120),
            ..Default::default()
        };

        let json = serde_json::to_string_pretty(&config).unwrap();
        assert!(!json.contains("target_timeout_secs"));

        let parsed: ResolverConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
        assert_eq!(parsed.query_timeout(), Some(Duration::from_secs(120)));
        assert_eq!(parsed.otest_query_program(), DEFAULT_OTEST_QUERY);
    }

    #[test]
    fn test_find_config_file_walks_up() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("App/Tests");
        std::fs::create_dir_all(&nested).unwrap();
        let config_path = dir.path().join("xcresolve.json");
        ResolverConfig {
            max_workers: Some(2),
            ..Default::default()
        }
        .save_to_file(&config_path)
        .unwrap();

        assert_eq!(ResolverConfig::find_config_file(&nested), Some(config_path));

        let config = ResolverConfig::load(&nested).unwrap();
        assert_eq!(config.max_workers(), 2);
    }

    #[test]
    fn test_dotfile_wins_in_same_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("xcresolve.json"), "{}").unwrap();
        std::fs::write(dir.path().join(".xcresolve.json"), "{}").unwrap();

        assert_eq!(
            ResolverConfig::find_config_file(dir.path()),
            Some(dir.path().join(".xcresolve.json"))
        );
    }

    #[test]
    fn test_invalid_config_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".xcresolve.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = ResolverConfig::load_from_file(&path).unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn test_merge_prefers_overrides() {
        let file = ResolverConfig {
            xcodebuild: Some("xcodebuild-beta".to_string()),
            max_workers: Some(8),
            ..Default::default()
        };
        let flags = ResolverConfig {
            max_workers: Some(2),
            ..Default::default()
        };

        let merged = file.merge(flags);
        assert_eq!(merged.max_workers, Some(2));
        assert_eq!(merged.xcodebuild_program(), "xcodebuild-beta");
    }

    #[test]
    fn test_validate() {
        assert!(ResolverConfig::default().validate().is_ok());

        let config = ResolverConfig {
            max_workers: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ResolverConfig {
            otest_query: Some(" ".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_resolve_options_from_config() {
        let config = ResolverConfig {
            max_workers: Some(3),
            target_timeout_secs: Some(600),
            ..Default::default()
        };

        let options = config.resolve_options();
        assert_eq!(options.max_workers, 3);
        assert_eq!(options.target_timeout, Some(Duration::from_secs(600)));
    }
}
