//! Configuration management for xcresolve

mod settings;

pub use settings::{
    CONFIG_FILE_NAMES, DEFAULT_OTEST_QUERY, DEFAULT_XCODEBUILD, ResolverConfig,
};
