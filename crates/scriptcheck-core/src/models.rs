//! Data carried between pipeline stages

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

pub use crate::config::DockerConfig;

/// The script under validation and its README, as read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptMetadata {
    pub script_path: PathBuf,
    pub script_name: String,
    pub script_content: String,
    pub readme_content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Success,
    Failed,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Success => write!(f, "SUCCESS"),
            Verdict::Failed => write!(f, "FAILED"),
        }
    }
}

/// A test the model predicts; `is_success` is its own claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub input_value: String,
    pub test_result: String,
    pub is_success: bool,
}

/// Wire shape of the analysis reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AnalyzeResponse {
    pub script_type: String,
    pub script_name: String,
    pub analysis: Verdict,
    pub tests: Vec<TestCase>,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub script_type: String,
    pub script_name: String,
    pub verdict: Verdict,
    pub tests: Vec<TestCase>,
    pub issues: Vec<String>,
    pub is_success: bool,
}

impl AnalysisResult {
    /// Normalises the script type and derives `is_success` instead of
    /// trusting the model's summary.
    pub fn from_response(response: AnalyzeResponse) -> Self {
        let is_success = response.issues.is_empty()
            && response.tests.iter().all(|test| test.is_success)
            && response.analysis == Verdict::Success;

        Self {
            script_type: response.script_type.trim().to_lowercase(),
            script_name: response.script_name,
            verdict: response.analysis,
            tests: response.tests,
            issues: response.issues,
            is_success,
        }
    }

    /// The test that gets executed for real.
    pub fn first_test(&self) -> Option<&TestCase> {
        self.tests.first()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DockerArtifacts {
    pub dockerfile_content: String,
    pub readme_content: String,
}

/// Files written for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutputs {
    pub output_dir: PathBuf,
    pub dockerfile_path: PathBuf,
    pub readme_path: PathBuf,
    pub script_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerResult {
    pub output: String,
    pub exit_code: i64,
    pub success: bool,
}

impl ContainerResult {
    pub fn new(output: String, exit_code: i64) -> Self {
        Self {
            output,
            exit_code,
            success: exit_code == 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestVerdict {
    pub success: bool,
    pub input: String,
    pub actual_output: String,
    pub expected_output: String,
}
