//! xcresolve - Resolves what is needed to launch Xcode test bundles
//!
//! This crate provides functionality to:
//! - Query and cache build settings for test targets (`xcodebuild -showBuildSettings`)
//! - List the test cases contained in a compiled test bundle (`otest-query`)
//! - Expand `$(NAME)` build setting references in launch arguments and environment
//! - Assemble one execution record per target, concurrently and in input order
pub mod cache;
pub mod cancel;
pub mod config;
pub mod error;
pub mod macros;
pub mod query;
pub mod resolver;
pub mod settings;
pub mod test_cases;
pub mod types;

// Re-export commonly used types and traits
pub use error::{Cancelled, Error, QueryError, Result};
pub use types::*;

// Re-export main API components
pub use cancel::CancelToken;
pub use config::ResolverConfig;
pub use macros::MacroExpander;
pub use query::{BuildSettingsQuery, OtestQuery, TestCaseQuery, XcodebuildSettingsQuery};
pub use resolver::{ResolutionAssembler, ResolutionSession, ResolveOptions};
pub use settings::SettingsStore;
pub use test_cases::TestCaseLister;
