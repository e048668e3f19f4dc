use anyhow::{Context, Result};
use indexmap::IndexMap;
use std::path::Path;
use tracing::debug;
use xcresolve_core::{BuildSettings, MacroExpander};

/// Settings from `settings_file` (a JSON object), then `overrides` on top
pub fn collect_settings(
    settings_file: Option<&Path>,
    overrides: &[(String, String)],
) -> Result<BuildSettings> {
    let mut settings: IndexMap<String, String> = match settings_file {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read settings file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse settings file {}", path.display()))?
        }
        None => IndexMap::new(),
    };

    for (name, value) in overrides {
        settings.insert(name.clone(), value.clone());
    }

    Ok(settings.into_iter().collect())
}

pub fn expand_command(
    settings_file: Option<&Path>,
    overrides: &[(String, String)],
    inputs: &[String],
) -> Result<()> {
    let settings = collect_settings(settings_file, overrides)?;
    debug!("Expanding {} inputs against {} settings", inputs.len(), settings.len());

    let expander = MacroExpander::new(Some(&settings));
    for input in inputs {
        println!("{}", expander.expand(input));
    }

    Ok(())
}
