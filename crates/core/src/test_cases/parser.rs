use crate::error::{Error, Result};

/// Parse the output of a test case query into `Class/method` identifiers.
///
/// Accepts either a JSON array of strings or one identifier per line. Empty
/// output is a bundle without tests.
pub fn parse_test_cases(output: &str) -> Result<Vec<String>> {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let test_cases: Vec<String> = if trimmed.starts_with('[') {
        serde_json::from_str(trimmed)
            .map_err(|e| Error::ParseError(format!("invalid test case list: {e}")))?
    } else {
        trimmed
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    };

    if let Some(bad) = test_cases.iter().find(|id| !is_test_case_id(id)) {
        return Err(Error::ParseError(format!(
            "unexpected test case identifier '{bad}' (expected Class/method)"
        )));
    }

    Ok(test_cases)
}

/// Whether `id` has the form `Class/method`
pub fn is_test_case_id(id: &str) -> bool {
    match id.split_once('/') {
        Some((class, method)) => {
            !class.is_empty()
                && !method.is_empty()
                && !method.contains('/')
                && !id.contains(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_list() {
        let cases = parse_test_cases(r#"["FooTests/testA", "FooTests/testB", "BarTests/testC"]"#)
            .unwrap();
        assert_eq!(cases, vec!["FooTests/testA", "FooTests/testB", "BarTests/testC"]);
    }

    #[test]
    fn test_parse_line_list_keeps_order() {
        let cases = parse_test_cases("\nZTests/testZ\r\nATests/testA\n\n").unwrap();
        assert_eq!(cases, vec!["ZTests/testZ", "ATests/testA"]);
    }

    #[test]
    fn test_empty_output_is_empty_list() {
        assert!(parse_test_cases("").unwrap().is_empty());
        assert!(parse_test_cases("  \n").unwrap().is_empty());
        assert!(parse_test_cases("[]").unwrap().is_empty());
    }

    #[test]
    fn test_rejects_malformed_output() {
        assert!(parse_test_cases("[\"FooTests/testA\"").is_err());
        assert!(parse_test_cases("dyld: Library not loaded").is_err());
        assert!(parse_test_cases(r#"["FooTests"]"#).is_err());
        assert!(parse_test_cases("[1, 2]").is_err());
    }

    #[test]
    fn test_is_test_case_id() {
        assert!(is_test_case_id("FooTests/testBar"));
        assert!(is_test_case_id("MyModule.FooTests/testBar"));
        assert!(!is_test_case_id("FooTests/"));
        assert!(!is_test_case_id("/testBar"));
        assert!(!is_test_case_id("A/B/C"));
        assert!(!is_test_case_id("Foo Tests/testBar"));
    }
}
