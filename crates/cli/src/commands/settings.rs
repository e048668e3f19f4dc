use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;
use xcresolve_core::{FetchOutcome, ResolutionSession, ResolverConfig, Testable};

use crate::cli::OutputFormat;
use crate::display::formatter::format_settings;

pub fn settings_command(
    config: &ResolverConfig,
    project: &Path,
    target: &str,
    sdk: &str,
    build_args: &[String],
    format: OutputFormat,
) -> Result<()> {
    debug!("Fetching build settings for {} in {}", target, project.display());

    let session = ResolutionSession::from_config(config);
    let testable = Testable::new(target, project);

    let settings = match session.settings_store().fetch(&testable, build_args, sdk) {
        FetchOutcome::Fetched(settings) => settings,
        FetchOutcome::Failed(error) => anyhow::bail!(error),
    };

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&*settings)
                .context("Failed to serialize build settings")?;
            println!("{json}");
        }
        OutputFormat::Text => print!("{}", format_settings(&settings)),
    }

    Ok(())
}
