use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};
use xcresolve_core::{ResolutionSession, ResolverConfig, Testable};

use crate::cli::OutputFormat;
use crate::display::formatter::{format_record, format_summary};

#[derive(Deserialize)]
#[serde(untagged)]
enum Manifest {
    List(Vec<Testable>),
    Document { testables: Vec<Testable> },
}

/// Read the testables of a manifest. Relative project paths are taken
/// relative to the manifest's directory.
pub fn load_manifest(path: &Path) -> Result<Vec<Testable>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest {}", path.display()))?;
    let manifest: Manifest = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse manifest {}", path.display()))?;

    let mut testables = match manifest {
        Manifest::List(testables) | Manifest::Document { testables } => testables,
    };

    let base = path.parent().unwrap_or_else(|| Path::new(""));
    for testable in &mut testables {
        if testable.project_path.is_relative() {
            testable.project_path = base.join(&testable.project_path);
        }
    }

    debug!("Loaded {} testables from {}", testables.len(), path.display());
    Ok(testables)
}

pub fn resolve_command(
    config: &ResolverConfig,
    manifest: &Path,
    sdk: &str,
    build_args: &[String],
    format: OutputFormat,
) -> Result<()> {
    let testables = load_manifest(manifest)?;
    let session = ResolutionSession::from_config(config);

    let records = session.resolve(&testables, build_args, sdk);
    info!(
        "Resolved {} targets ({} settings queries, {} test case queries)",
        records.len(),
        session.settings_store().queries_started(),
        session.test_case_lister().queries_started()
    );

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&records)
                .context("Failed to serialize execution info")?;
            println!("{json}");
        }
        OutputFormat::Text => {
            for record in &records {
                println!("{}", format_record(record));
            }
            println!("{}", format_summary(&records));
        }
    }

    Ok(())
}
