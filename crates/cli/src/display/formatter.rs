use xcresolve_core::query::shell_quote;
use xcresolve_core::{BuildSettings, TestableExecutionInfo};

/// Human-readable view of one execution record
pub fn format_record(info: &TestableExecutionInfo) -> String {
    let testable = info.testable();
    let mut out = format!(
        "🎯 {} ({})\n",
        testable.target,
        testable.project_path.display()
    );

    match (info.build_settings(), info.build_settings_error()) {
        (Some(settings), _) => {
            out.push_str(&format!("   ⚙️  Build settings: {}", settings.len()));
            if let Some(sdk) = settings.sdk_name() {
                out.push_str(&format!(" (sdk {sdk})"));
            }
            out.push('\n');
        }
        (None, error) => out.push_str(&format!(
            "   ❌ Build settings: {}\n",
            error.unwrap_or("unavailable")
        )),
    }

    match (info.test_cases(), info.test_cases_error()) {
        (Some(test_cases), _) => {
            out.push_str(&format!("   🧪 Test cases: {}\n", test_cases.len()));
            for test_case in test_cases {
                out.push_str(&format!("      - {test_case}\n"));
            }
        }
        (None, error) => out.push_str(&format!(
            "   ❌ Test cases: {}\n",
            error.unwrap_or("unavailable")
        )),
    }

    if !info.expanded_arguments().is_empty() {
        let args: Vec<String> = info
            .expanded_arguments()
            .iter()
            .map(|arg| shell_quote(arg))
            .collect();
        out.push_str(&format!("   📋 Arguments: {}\n", args.join(" ")));
    }

    if !info.expanded_environment().is_empty() {
        out.push_str("   🌍 Environment:\n");
        for (key, value) in info.expanded_environment() {
            out.push_str(&format!("      {key}={}\n", shell_quote(value)));
        }
    }

    out
}

/// One `NAME = value` line per setting, in dump order
pub fn format_settings(settings: &BuildSettings) -> String {
    settings
        .iter()
        .map(|(name, value)| format!("{name} = {value}\n"))
        .collect()
}

pub fn format_summary(records: &[TestableExecutionInfo]) -> String {
    let complete = records.iter().filter(|info| info.is_complete()).count();
    if complete == records.len() {
        format!("✅ Resolved {complete} of {} targets", records.len())
    } else {
        format!(
            "⚠️  Resolved {complete} of {} targets ({} with errors)",
            records.len(),
            records.len() - complete
        )
    }
}
