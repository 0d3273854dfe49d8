//! Visual theme and styling.

use console::Style;

/// Terminal styles for run output.
#[derive(Debug, Clone)]
pub struct PipegraphTheme {
    /// Style for success messages (green).
    pub success: Style,
    /// Style for warning messages (orange).
    pub warning: Style,
    /// Style for error messages (red bold).
    pub error: Style,
    /// Style for dim/secondary text.
    pub dim: Style,
    /// Style for step names (bold).
    pub step_title: Style,
    /// Style for headers (magenta bold).
    pub header: Style,
    /// Style for durations (dim).
    pub duration: Style,
    /// Style for links shown in listings (cyan).
    pub link: Style,
}

impl Default for PipegraphTheme {
    fn default() -> Self {
        Self::new()
    }
}

impl PipegraphTheme {
    pub fn new() -> Self {
        Self {
            success: Style::new().green(),
            warning: Style::new().color256(208),
            error: Style::new().red().bold(),
            dim: Style::new().dim(),
            step_title: Style::new().bold(),
            header: Style::new().bold().magenta(),
            duration: Style::new().dim(),
            link: Style::new().cyan(),
        }
    }

    /// Create a theme without colors (for non-TTY or --no-color).
    pub fn plain() -> Self {
        Self {
            success: Style::new(),
            warning: Style::new(),
            error: Style::new(),
            dim: Style::new(),
            step_title: Style::new(),
            header: Style::new(),
            duration: Style::new(),
            link: Style::new(),
        }
    }

    pub fn format_success(&self, msg: &str) -> String {
        format!("{}", self.success.apply_to(format!("✓ {}", msg)))
    }

    pub fn format_warning(&self, msg: &str) -> String {
        format!("{}", self.warning.apply_to(format!("⚠ {}", msg)))
    }

    pub fn format_error(&self, msg: &str) -> String {
        format!("{}", self.error.apply_to(format!("✗ {}", msg)))
    }

    pub fn format_skipped(&self, msg: &str) -> String {
        format!("{}", self.dim.apply_to(format!("○ {}", msg)))
    }

    /// Format a step name with its description.
    pub fn format_step(&self, name: &str, description: &str) -> String {
        format!(
            "{} {}",
            self.step_title.apply_to(format!("◆ {}", name)),
            self.dim.apply_to(description)
        )
    }

    pub fn format_header(&self, title: &str) -> String {
        format!("{}", self.header.apply_to(title))
    }
}

/// Check if colors should be enabled.
pub fn should_use_colors() -> bool {
    // https://no-color.org/
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    console::Term::stdout().is_term()
}
