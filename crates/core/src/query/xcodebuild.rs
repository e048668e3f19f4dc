use std::time::Duration;

use super::{BuildSettingsQuery, SettingsRequest, ToolCommand};
use crate::{cancel::CancelToken, error::QueryError};

/// Dumps build settings by running `xcodebuild -showBuildSettings`
#[derive(Debug, Clone)]
pub struct XcodebuildSettingsQuery {
    program: String,
    timeout: Option<Duration>,
}

impl XcodebuildSettingsQuery {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Command line for a request, e.g.
    /// `xcodebuild -project Foo.xcodeproj -target FooTests -sdk iphonesimulator -configuration Debug -showBuildSettings`
    pub fn build_command(&self, request: &SettingsRequest<'_>) -> ToolCommand {
        let project = request.testable.project_path.to_string_lossy();
        ToolCommand::new(self.program.as_str())
            .args(["-project", project.as_ref()])
            .args(["-target", request.testable.target.as_str()])
            .args(["-sdk", request.sdk])
            .args(request.build_arguments.iter().map(String::as_str))
            .arg("-showBuildSettings")
            .with_timeout(self.timeout)
    }
}

impl Default for XcodebuildSettingsQuery {
    fn default() -> Self {
        Self::new("xcodebuild")
    }
}

impl BuildSettingsQuery for XcodebuildSettingsQuery {
    fn show_build_settings(
        &self,
        request: &SettingsRequest<'_>,
        cancel: &CancelToken,
    ) -> Result<String, QueryError> {
        self.build_command(request).run(cancel)
    }

    fn name(&self) -> &str {
        &self.program
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Testable;

    #[test]
    fn test_build_command_orders_arguments() {
        let testable = Testable::new("FooTests", "/src/Foo.xcodeproj");
        let build_arguments = vec!["-configuration".to_string(), "Debug".to_string()];
        let request = SettingsRequest {
            testable: &testable,
            build_arguments: &build_arguments,
            sdk: "iphonesimulator",
        };

        let command = XcodebuildSettingsQuery::default().build_command(&request);

        assert_eq!(command.program, "xcodebuild");
        assert_eq!(
            command.args,
            vec![
                "-project",
                "/src/Foo.xcodeproj",
                "-target",
                "FooTests",
                "-sdk",
                "iphonesimulator",
                "-configuration",
                "Debug",
                "-showBuildSettings",
            ]
        );
    }
}
