//! Output mode and writer.

use std::str::FromStr;

/// Output verbosity mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Show every step as it starts and finishes.
    #[default]
    Normal,
    /// Show failures and the final summary only.
    Quiet,
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "quiet" => Ok(Self::Quiet),
            _ => Err(format!("unknown output mode: {}", s)),
        }
    }
}

impl OutputMode {
    /// Check if this mode shows per-step progress.
    pub fn shows_progress(&self) -> bool {
        matches!(self, Self::Normal)
    }
}

/// Output writer that respects output mode.
#[derive(Debug)]
pub struct Output {
    mode: OutputMode,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Write a progress line if the mode allows it.
    pub fn progress(&self, msg: &str) {
        if self.mode.shows_progress() {
            println!("{}", msg);
        }
    }

    /// Write a line regardless of mode.
    pub fn println(&self, msg: &str) {
        println!("{}", msg);
    }

    /// Write to stderr regardless of mode.
    pub fn eprintln(&self, msg: &str) {
        eprintln!("{}", msg);
    }
}
