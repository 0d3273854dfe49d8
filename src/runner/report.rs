//! JUnit-style record of a run.
//!
//! One [`TestCase`] per step attempt, named after the step's description.
//! The suite serializes to JSON through serde or to JUnit XML through
//! [`TestSuite::to_junit_xml`].

use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{PipegraphError, Result};

/// Outcome of one step attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestCase {
    /// Step description.
    pub name: String,
    /// Wall time in seconds.
    pub duration_seconds: f64,
    /// Reason the step was skipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<String>,
    /// Failure message, followed by any captured output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl TestCase {
    /// Whether the step failed.
    pub fn failed(&self) -> bool {
        self.failure.is_some()
    }

    /// Whether the step was skipped.
    pub fn is_skipped(&self) -> bool {
        self.skipped.is_some()
    }
}

/// Aggregate of every step attempt in a run.
#[derive(Debug, Clone, Serialize)]
pub struct TestSuite {
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub duration_seconds: f64,
    pub num_tests: usize,
    pub num_failed: usize,
    pub num_skipped: usize,
    pub test_cases: Vec<TestCase>,
}

impl TestSuite {
    /// Create an empty suite stamped with the current time.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            timestamp: Utc::now(),
            duration_seconds: 0.0,
            num_tests: 0,
            num_failed: 0,
            num_skipped: 0,
            test_cases: Vec::new(),
        }
    }

    fn push(&mut self, case: TestCase) {
        self.num_tests += 1;
        if case.failed() {
            self.num_failed += 1;
        }
        if case.is_skipped() {
            self.num_skipped += 1;
        }
        self.test_cases.push(case);
    }

    /// Record a step that completed.
    pub fn record_success(&mut self, name: &str, duration: Duration) {
        self.push(TestCase {
            name: name.to_string(),
            duration_seconds: duration.as_secs_f64(),
            skipped: None,
            failure: None,
        });
    }

    /// Record a step that did not perform its work.
    pub fn record_skip(&mut self, name: &str, duration: Duration, reason: &str) {
        self.push(TestCase {
            name: name.to_string(),
            duration_seconds: duration.as_secs_f64(),
            skipped: Some(reason.to_string()),
            failure: None,
        });
    }

    /// Record a failed step, keeping any output the error captured.
    pub fn record_failure(&mut self, name: &str, duration: Duration, err: &PipegraphError) {
        let mut message = err.to_string();
        if let Some(output) = err.additional_output() {
            message.push_str("\n\n");
            message.push_str(output);
        }
        self.push(TestCase {
            name: name.to_string(),
            duration_seconds: duration.as_secs_f64(),
            skipped: None,
            failure: Some(message),
        });
    }

    /// Set the total wall time of the run.
    pub fn finish(&mut self, duration: Duration) {
        self.duration_seconds = duration.as_secs_f64();
    }

    /// Whether no recorded step failed.
    pub fn passed(&self) -> bool {
        self.num_failed == 0
    }

    /// Render as a JUnit `<testsuite>` document.
    pub fn to_junit_xml(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        let _ = writeln!(
            out,
            "<testsuite name=\"{}\" tests=\"{}\" failures=\"{}\" skipped=\"{}\" time=\"{:.3}\" timestamp=\"{}\">",
            escape_xml(&self.name),
            self.num_tests,
            self.num_failed,
            self.num_skipped,
            self.duration_seconds,
            self.timestamp.to_rfc3339(),
        );
        for case in &self.test_cases {
            let _ = write!(
                out,
                "  <testcase name=\"{}\" time=\"{:.3}\"",
                escape_xml(&case.name),
                case.duration_seconds
            );
            match (&case.skipped, &case.failure) {
                (None, None) => out.push_str("></testcase>\n"),
                (skipped, failure) => {
                    out.push_str(">\n");
                    if let Some(reason) = skipped {
                        let _ = writeln!(out, "    <skipped message=\"{}\"></skipped>", escape_xml(reason));
                    }
                    if let Some(message) = failure {
                        let _ = writeln!(out, "    <failure>{}</failure>", escape_xml(message));
                    }
                    out.push_str("  </testcase>\n");
                }
            }
        }
        out.push_str("</testsuite>\n");
        out
    }

    /// Write the JUnit XML rendering to `path`.
    pub fn write_junit(&self, path: &Path) -> Result<()> {
        ensure_parent(path)?;
        fs::write(path, self.to_junit_xml())?;
        Ok(())
    }

    /// Write the JSON rendering to `path`.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(anyhow::Error::from)?;
        ensure_parent(path)?;
        fs::write(path, json)?;
        Ok(())
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn escape_xml(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_follow_records() {
        let mut suite = TestSuite::new("pipeline");
        suite.record_success("build src", Duration::from_millis(1500));
        suite.record_skip("build bin", Duration::ZERO, "dry run");
        suite.record_failure(
            "build rpm",
            Duration::from_secs(2),
            &PipegraphError::Cancelled,
        );

        assert_eq!(suite.num_tests, 3);
        assert_eq!(suite.num_failed, 1);
        assert_eq!(suite.num_skipped, 1);
        assert!(!suite.passed());
        assert_eq!(suite.test_cases[0].duration_seconds, 1.5);
    }

    #[test]
    fn failure_appends_captured_output() {
        let mut suite = TestSuite::new("pipeline");
        let err = PipegraphError::StepFailed {
            step: "rpm".into(),
            message: "exit status 2".into(),
            output: Some("make: *** [rpm] Error 2".into()),
        };
        suite.record_failure("build rpm", Duration::ZERO, &err);

        let failure = suite.test_cases[0].failure.as_deref().unwrap();
        assert!(failure.starts_with("step rpm failed: exit status 2"));
        assert!(failure.ends_with("\n\nmake: *** [rpm] Error 2"));
    }

    #[test]
    fn junit_xml_escapes_and_nests() {
        let mut suite = TestSuite::new("ci <main>");
        suite.record_success("ok", Duration::ZERO);
        suite.record_failure(
            "bad",
            Duration::ZERO,
            &PipegraphError::ConfigValidationError {
                message: "a & b".into(),
            },
        );
        let xml = suite.to_junit_xml();

        assert!(xml.contains("<testsuite name=\"ci &lt;main&gt;\" tests=\"2\" failures=\"1\""));
        assert!(xml.contains("<testcase name=\"ok\" time=\"0.000\"></testcase>"));
        assert!(xml.contains("<failure>Invalid pipeline: a &amp; b</failure>"));
        assert!(xml.trim_end().ends_with("</testsuite>"));
    }

    #[test]
    fn json_omits_empty_outcomes() {
        let mut suite = TestSuite::new("pipeline");
        suite.record_success("ok", Duration::ZERO);
        let value = serde_json::to_value(&suite).unwrap();
        let case = &value["test_cases"][0];
        assert_eq!(case["name"], "ok");
        assert!(case.get("failure").is_none());
        assert!(case.get("skipped").is_none());
    }
}
