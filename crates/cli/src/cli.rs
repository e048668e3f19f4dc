use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::commands::{expand_command, resolve_command, settings_command};
use crate::config::load_config;

/// Resolve build settings, test cases and launch configuration of Xcode test targets
#[derive(Parser, Debug)]
#[command(name = "xcresolve", version, about, long_about = None)]
#[command(after_help = "ENVIRONMENT:\n    RUST_LOG=debug    Enable debug logging")]
pub struct Cli {
    /// Log resolution steps to stderr
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Config file to use instead of searching for .xcresolve.json
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve every testable listed in a manifest
    Resolve {
        /// JSON manifest: a list of testables, or an object with a `testables` list
        #[arg(short = 'm', long = "manifest")]
        manifest: PathBuf,

        /// SDK to query build settings for (e.g. iphonesimulator)
        #[arg(long = "sdk")]
        sdk: String,

        #[arg(short = 'f', long = "format", value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Maximum number of targets resolved at once
        #[arg(short = 'j', long = "workers")]
        workers: Option<usize>,

        /// Seconds before a single tool invocation is abandoned
        #[arg(long = "query-timeout")]
        query_timeout: Option<u64>,

        /// Extra arguments passed to xcodebuild
        #[arg(last = true)]
        build_args: Vec<String>,
    },
    /// Print the build settings of one target
    Settings {
        /// Path to the .xcodeproj
        #[arg(short = 'p', long = "project")]
        project: PathBuf,

        #[arg(short = 't', long = "target")]
        target: String,

        #[arg(long = "sdk")]
        sdk: String,

        #[arg(short = 'f', long = "format", value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Extra arguments passed to xcodebuild
        #[arg(last = true)]
        build_args: Vec<String>,
    },
    /// Expand $(NAME) references against the given settings
    Expand {
        /// Build setting as NAME=VALUE; may be repeated
        #[arg(short = 's', long = "setting", value_parser = parse_setting)]
        settings: Vec<(String, String)>,

        /// JSON object of build settings, applied before --setting values
        #[arg(long = "settings-file")]
        settings_file: Option<PathBuf>,

        /// Strings to expand, one result per line
        #[arg(required = true)]
        inputs: Vec<String>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl Cli {
    /// Execute the command
    pub fn execute(self) -> Result<()> {
        match self.command {
            Commands::Resolve {
                manifest,
                sdk,
                format,
                workers,
                query_timeout,
                build_args,
            } => {
                let config = load_config(self.config.as_deref())?.merge(
                    xcresolve_core::ResolverConfig {
                        max_workers: workers,
                        query_timeout_secs: query_timeout,
                        ..Default::default()
                    },
                );
                resolve_command(&config, &manifest, &sdk, &build_args, format)
            }
            Commands::Settings {
                project,
                target,
                sdk,
                format,
                build_args,
            } => {
                let config = load_config(self.config.as_deref())?;
                settings_command(&config, &project, &target, &sdk, &build_args, format)
            }
            Commands::Expand {
                settings,
                settings_file,
                inputs,
            } => expand_command(settings_file.as_deref(), &settings, &inputs),
        }
    }
}

fn parse_setting(raw: &str) -> std::result::Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    if name.is_empty() {
        return Err(format!("missing setting name in '{raw}'"));
    }
    Ok((name.to_string(), value.to_string()))
}
