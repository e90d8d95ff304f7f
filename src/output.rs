//! # Output Configuration
//!
//! Controls how the CLI decorates its human-readable output. Colors and status
//! markers are used only when the terminal and the user allow them:
//!
//! - `--color=always|never|auto`
//! - `NO_COLOR` (any value) disables colors in auto mode
//! - `CLICOLOR=0` disables, `CLICOLOR_FORCE=1` forces
//! - `TERM=dumb` disables
//!
//! Diagnostics (skips and failures) go to stderr; results go to stdout so that
//! `permissions --dry-run > file.json` stays clean.

use std::env;

use console::style;

/// Output configuration for controlling colors and markers.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub use_color: bool,
    /// Suppress everything but errors.
    pub quiet: bool,
}

impl OutputConfig {
    /// Create an output configuration from the environment and the `--color`
    /// flag value (`always`, `never` or `auto`).
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };
        Self {
            use_color,
            quiet: false,
        }
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    fn detect_color_support() -> bool {
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }
        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }
        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }
        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }
        console::Term::stderr().features().colors_supported()
    }

    /// Progress or result line on stdout.
    pub fn info(&self, line: impl AsRef<str>) {
        if !self.quiet {
            println!("{}", line.as_ref());
        }
    }

    /// Line prefixed with a status marker on stdout.
    pub fn status(&self, status: Status, line: impl AsRef<str>) {
        if !self.quiet {
            println!("{} {}", self.marker(status), line.as_ref());
        }
    }

    /// Skip or failure on stderr; printed even when quiet.
    pub fn problem(&self, status: Status, line: impl AsRef<str>) {
        eprintln!("{} {}", self.marker(status), line.as_ref());
    }

    pub fn marker(&self, status: Status) -> String {
        let plain = status.plain();
        if !self.use_color {
            return plain.to_string();
        }
        let styled = style(plain).force_styling(true);
        match status {
            Status::Ok => styled.green().to_string(),
            Status::Changed => styled.cyan().bold().to_string(),
            Status::Skip => styled.yellow().to_string(),
            Status::Error => styled.red().bold().to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Outcome class of a printed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Nothing needed doing.
    Ok,
    /// Something was (or would be) created or written.
    Changed,
    /// Input was skipped.
    Skip,
    Error,
}

impl Status {
    pub fn plain(self) -> &'static str {
        match self {
            Status::Ok => "[ok]",
            Status::Changed => "[new]",
            Status::Skip => "[skip]",
            Status::Error => "[error]",
        }
    }
}
