//! Run progress and summary rendering.

use std::time::Duration;

use crate::runner::{RunProgress, TestSuite};
use crate::ui::{Output, PipegraphTheme};

/// Renders executor progress events as lines of text.
pub struct ProgressPrinter<'a> {
    output: &'a Output,
    theme: &'a PipegraphTheme,
    dry_run: bool,
}

impl<'a> ProgressPrinter<'a> {
    pub fn new(output: &'a Output, theme: &'a PipegraphTheme, dry_run: bool) -> Self {
        Self {
            output,
            theme,
            dry_run,
        }
    }

    /// Render one event. Failures are printed even in quiet mode.
    pub fn handle(&self, event: RunProgress<'_>) {
        match event {
            RunProgress::StepStarting { name, description } => {
                self.output.progress(&self.theme.format_step(name, description));
            }
            RunProgress::StepFinished {
                name,
                duration,
                error: None,
                ..
            } => {
                let line = if self.dry_run {
                    self.theme.format_skipped(&format!("{} (dry run)", name))
                } else {
                    format!(
                        "{} {}",
                        self.theme.format_success(name),
                        self.theme.duration.apply_to(format_duration(duration))
                    )
                };
                self.output.progress(&line);
            }
            RunProgress::StepFinished {
                error: Some(err), ..
            } => {
                self.output.eprintln(&self.theme.format_error(&err.to_string()));
                if let Some(output) = err.additional_output() {
                    for line in output.lines() {
                        self.output.eprintln(&format!("    {}", self.theme.dim.apply_to(line)));
                    }
                }
            }
        }
    }
}

/// One-line summary of a finished run.
pub fn format_summary(suite: &TestSuite, theme: &PipegraphTheme) -> String {
    let passed = suite.num_tests - suite.num_failed - suite.num_skipped;
    let mut parts = vec![format!("{} passed", passed)];
    if suite.num_failed > 0 {
        parts.push(format!("{} failed", suite.num_failed));
    }
    if suite.num_skipped > 0 {
        parts.push(format!("{} skipped", suite.num_skipped));
    }
    let text = format!(
        "{} steps: {} in {}",
        suite.num_tests,
        parts.join(", "),
        format_duration(Duration::from_secs_f64(suite.duration_seconds.max(0.0)))
    );
    if suite.num_failed > 0 {
        theme.format_error(&text)
    } else {
        theme.format_success(&text)
    }
}

/// Format a duration for display.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 1.0 {
        format!("{}ms", d.as_millis())
    } else if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        let mins = secs / 60.0;
        format!("{:.1}m", mins)
    }
}
