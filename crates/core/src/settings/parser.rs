use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};
use crate::types::BuildSettings;

static SECTION_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^Build settings for action (\S+) and target "?(.+?)"?:\s*$"#)
        .expect("section header pattern is valid")
});

static SETTING_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s+([A-Za-z_][A-Za-z0-9_]*) =(?: (.*))?$").expect("setting pattern is valid")
});

/// Settings of one `Build settings for action ... and target ...:` section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsSection {
    pub action: String,
    pub target: String,
    pub settings: BuildSettings,
}

/// Split `xcodebuild -showBuildSettings` output into its per-target sections.
///
/// Lines outside a section (warnings, the `Command line invocation:` banner)
/// are ignored.
pub fn parse_sections(output: &str) -> Vec<SettingsSection> {
    let mut sections: Vec<SettingsSection> = Vec::new();

    for line in output.lines() {
        if let Some(caps) = SECTION_HEADER.captures(line) {
            sections.push(SettingsSection {
                action: caps[1].to_string(),
                target: caps[2].to_string(),
                settings: BuildSettings::new(),
            });
            continue;
        }

        let Some(section) = sections.last_mut() else {
            continue;
        };
        if let Some(caps) = SETTING_LINE.captures(line) {
            let value = caps.get(2).map_or("", |m| m.as_str());
            section
                .settings
                .insert(caps[1].to_string(), value.trim_end().to_string());
        }
    }

    sections
}

/// Extract the settings of `target` from `xcodebuild -showBuildSettings` output.
///
/// A lone section is accepted even if its target name differs, since some
/// xcodebuild versions report the product name instead of the target name.
pub fn parse_build_settings(output: &str, target: &str) -> Result<BuildSettings> {
    let mut sections = parse_sections(output);

    if sections.is_empty() {
        return Err(Error::ParseError(
            "no build settings found in xcodebuild output".to_string(),
        ));
    }

    let index = match sections.iter().position(|s| s.target == target) {
        Some(index) => index,
        None if sections.len() == 1 => 0,
        None => {
            let found: Vec<&str> = sections.iter().map(|s| s.target.as_str()).collect();
            return Err(Error::ParseError(format!(
                "no build settings for target '{target}' (found: {})",
                found.join(", ")
            )));
        }
    };

    let section = sections.swap_remove(index);
    if section.settings.is_empty() {
        return Err(Error::ParseError(format!(
            "build settings section for target '{}' is empty",
            section.target
        )));
    }
    Ok(section.settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SINGLE_TARGET: &str = r#"Command line invocation:
    /usr/bin/xcodebuild -project Foo.xcodeproj -target FooTests -showBuildSettings

Build settings for action build and target FooTests:
    ACTION = build
    BUILT_PRODUCTS_DIR = /build/Debug-iphonesimulator
    FULL_PRODUCT_NAME = FooTests.xctest
    OTHER_CFLAGS = 
    TEST_HOST = $(BUILT_PRODUCTS_DIR)/Foo.app/Foo
    GCC_PREPROCESSOR_DEFINITIONS = DEBUG=1 FOO="a b"

"#;

    #[test]
    fn test_parse_single_section() {
        let settings = parse_build_settings(SINGLE_TARGET, "FooTests").unwrap();

        assert_eq!(settings.len(), 6);
        assert_eq!(settings.get("ACTION"), Some("build"));
        assert_eq!(settings.get("OTHER_CFLAGS"), Some(""));
        assert_eq!(
            settings.get("GCC_PREPROCESSOR_DEFINITIONS"),
            Some(r#"DEBUG=1 FOO="a b""#)
        );
        let names: Vec<_> = settings.iter().map(|(k, _)| k).take(2).collect();
        assert_eq!(names, vec!["ACTION", "BUILT_PRODUCTS_DIR"]);
    }

    #[test]
    fn test_selects_matching_section() {
        let output = "\
Build settings for action build and target \"Foo\":
    PRODUCT_NAME = Foo

Build settings for action build and target \"FooTests\":
    PRODUCT_NAME = FooTests
";
        let settings = parse_build_settings(output, "FooTests").unwrap();
        assert_eq!(settings.get("PRODUCT_NAME"), Some("FooTests"));

        let sections = parse_sections(output);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].target, "Foo");
        assert_eq!(sections[0].action, "build");
    }

    #[test]
    fn test_ambiguous_sections_without_match_fail() {
        let output = "\
Build settings for action build and target A:
    X = 1
Build settings for action build and target B:
    X = 2
";
        let err = parse_build_settings(output, "C").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Parse error: no build settings for target 'C' (found: A, B)"
        );
    }

    #[test]
    fn test_lone_section_is_accepted_for_other_target_name() {
        let output = "Build settings for action build and target Renamed:\n    X = 1\n";
        let settings = parse_build_settings(output, "FooTests").unwrap();
        assert_eq!(settings.get("X"), Some("1"));
    }

    #[test]
    fn test_malformed_output_is_an_error() {
        assert!(parse_build_settings("", "FooTests").is_err());
        assert!(parse_build_settings("xcodebuild: error: bad flag", "FooTests").is_err());
        assert!(
            parse_build_settings("Build settings for action build and target T:\n", "T").is_err()
        );
    }
}
