//! Output comparison and the final report

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Write;

use crate::models::{AnalysisResult, ContainerResult, RunOutputs, TestCase, TestVerdict};

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Strip zero-width characters and quotes, collapse whitespace, trim.
pub fn normalize_output(text: &str) -> String {
    let stripped: String = text
        .chars()
        .filter(|c| !matches!(c, '\u{200B}'..='\u{200D}' | '\u{FEFF}' | '\'' | '"'))
        .collect();
    WHITESPACE_RUN
        .replace_all(&stripped, " ")
        .trim()
        .to_string()
}

/// Compare the container's output with the test's predicted result.
pub fn compare(test: &TestCase, container: &ContainerResult) -> TestVerdict {
    let actual = normalize_output(&container.output);
    let expected = normalize_output(&test.test_result);
    let success = actual.contains(&expected);

    if success {
        log::info!("Output matches expected result for input {:?}", test.input_value);
    } else {
        log::info!(
            "Output mismatch for input {:?}: expected {:?}, got {:?}",
            test.input_value,
            expected,
            actual
        );
    }

    TestVerdict {
        success,
        input: test.input_value.clone(),
        actual_output: container.output.trim().to_string(),
        expected_output: test.test_result.clone(),
    }
}

/// Everything a completed run produced.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub analysis: AnalysisResult,
    pub verdict: TestVerdict,
    pub outputs: RunOutputs,
    pub container: ContainerResult,
}

impl ValidationReport {
    pub fn render(&self) -> String {
        let analysis = &self.analysis;
        let mut out = String::new();

        let _ = writeln!(
            out,
            "{} ({}) - {}",
            analysis.script_name, analysis.script_type, analysis.verdict
        );

        let _ = writeln!(out, "\nVirtual tests:");
        for (index, test) in analysis.tests.iter().enumerate() {
            let mark = if test.is_success { '✓' } else { '✗' };
            let _ = writeln!(
                out,
                "  {} Test #{}: {} -> {}",
                mark,
                index + 1,
                test.input_value,
                test.test_result
            );
        }
        if !analysis.issues.is_empty() {
            let _ = writeln!(out, "Issues found: {}", analysis.issues.len());
        }

        let _ = writeln!(out, "\nActual test execution:");
        if self.verdict.success {
            let _ = writeln!(out, "✓ Test passed");
        } else {
            let _ = writeln!(out, "✗ Test failed");
            let _ = writeln!(out, "  Input: {}", self.verdict.input);
            let _ = writeln!(out, "  Expected: {}", self.verdict.expected_output);
            let _ = writeln!(out, "  Actual: {}", self.verdict.actual_output);
        }
        let _ = writeln!(out, "  Exit code: {}", self.container.exit_code);
        let _ = write!(out, "\nArtifacts written to {}", self.outputs.output_dir.display());

        out
    }
}
