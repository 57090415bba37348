//! Message formatting and display.
//!
//! This module provides formatted status output for different message
//! types with support for quiet and verbose modes. Reports themselves are
//! rendered by [`ReportRenderer`](crate::output::ReportRenderer).
//!
//! # Examples
//!
//! ```
//! use printspec::output::formatter::{OutputFormatter, MessageLevel};
//!
//! let formatter = OutputFormatter::new(false, false);
//! formatter.info("Validating 3 files...");
//! formatter.success("All items passed");
//! formatter.error("Something went wrong");
//! ```

use crate::config::RunConfig;
use std::io::{self, IsTerminal, Write};

/// Level of output message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    /// Informational message.
    Info,
    /// Success message.
    Success,
    /// Warning message.
    Warning,
    /// Error message.
    Error,
    /// Debug/verbose message.
    Debug,
}

impl MessageLevel {
    /// Symbol printed before messages of this level.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Info => "",
            Self::Success => "✓ ",
            Self::Warning => "⚠ ",
            Self::Error => "✗ ",
            Self::Debug => "→ ",
        }
    }

    /// ANSI color escape for this level.
    pub fn color_code(self) -> &'static str {
        match self {
            Self::Info => "",
            Self::Success => "\x1b[32m", // Green
            Self::Warning => "\x1b[33m", // Yellow
            Self::Error => "\x1b[31m",   // Red
            Self::Debug => "\x1b[36m",   // Cyan
        }
    }

    /// Wrap `text` in this level's color when `colored` is set.
    pub fn paint(self, text: &str, colored: bool) -> String {
        let color_code = self.color_code();
        if colored && !color_code.is_empty() {
            format!("{color_code}{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }
}

/// Output formatter with configurable verbosity.
///
/// Informational output goes to stdout; warnings and errors go to stderr.
#[derive(Debug, Clone)]
pub struct OutputFormatter {
    /// Whether to suppress non-error output.
    quiet: bool,
    /// Whether to show verbose output.
    verbose: bool,
    /// Whether to use colored output.
    colored: bool,
}

impl OutputFormatter {
    /// Create a new output formatter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - Suppress non-error output
    /// * `verbose` - Show verbose output
    pub fn new(quiet: bool, verbose: bool) -> Self {
        Self {
            quiet,
            verbose,
            colored: Self::should_use_color(),
        }
    }

    /// Create a formatter from batch settings.
    ///
    /// JSON output implies quiet so stdout carries only the document.
    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(!config.should_print(), config.verbose)
    }

    /// Create a quiet formatter (only errors).
    pub fn quiet() -> Self {
        Self::new(true, false)
    }

    /// Create a verbose formatter.
    pub fn verbose() -> Self {
        Self::new(false, true)
    }

    /// Override color detection.
    pub fn with_color(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    /// Detect if colored output should be used.
    ///
    /// Returns true if stdout is a TTY, TERM is set and NO_COLOR is not.
    fn should_use_color() -> bool {
        io::stdout().is_terminal() && std::env::var("TERM").is_ok() && std::env::var_os("NO_COLOR").is_none()
    }

    /// Print an informational message.
    ///
    /// Suppressed in quiet mode.
    pub fn info(&self, message: &str) {
        if !self.quiet {
            self.print_message(MessageLevel::Info, message);
        }
    }

    /// Print a success message.
    ///
    /// Suppressed in quiet mode.
    pub fn success(&self, message: &str) {
        if !self.quiet {
            self.print_message(MessageLevel::Success, message);
        }
    }

    /// Print a warning message.
    ///
    /// Always displayed (even in quiet mode).
    pub fn warning(&self, message: &str) {
        self.print_message(MessageLevel::Warning, message);
    }

    /// Print an error message.
    ///
    /// Always displayed.
    pub fn error(&self, message: &str) {
        self.print_message(MessageLevel::Error, message);
    }

    /// Print a debug/verbose message.
    ///
    /// Only displayed in verbose mode.
    pub fn debug(&self, message: &str) {
        if self.verbose && !self.quiet {
            self.print_message(MessageLevel::Debug, message);
        }
    }

    /// Format a message with level-appropriate prefix and color.
    pub fn format_message(&self, level: MessageLevel, message: &str) -> String {
        level.paint(&format!("{}{message}", level.prefix()), self.colored)
    }

    fn print_message(&self, level: MessageLevel, message: &str) {
        let line = self.format_message(level, message);
        match level {
            MessageLevel::Warning | MessageLevel::Error => eprintln!("{line}"),
            _ => println!("{line}"),
        }
    }

    /// Print a progress indicator.
    ///
    /// Suppressed in quiet mode and when stdout is not a terminal.
    ///
    /// # Arguments
    ///
    /// * `current` - Current progress value
    /// * `total` - Total value
    /// * `message` - Optional message to display
    pub fn progress(&self, current: usize, total: usize, message: Option<&str>) {
        if self.quiet || !self.colored {
            return;
        }

        let msg = message.unwrap_or("");
        print!("\r\x1b[K  [{current}/{total}] {msg}");
        io::stdout().flush().ok();

        if current == total {
            self.clear_line();
        }
    }

    /// Clear the current line (useful for progress updates).
    pub fn clear_line(&self) {
        if !self.quiet && self.colored {
            print!("\r\x1b[K");
            io::stdout().flush().ok();
        }
    }

    /// Print already-rendered output as-is.
    ///
    /// Never suppressed: this is the program's primary output.
    pub fn raw(&self, text: &str) {
        let mut stdout = io::stdout().lock();
        stdout.write_all(text.as_bytes()).ok();
        if !text.ends_with('\n') {
            stdout.write_all(b"\n").ok();
        }
        stdout.flush().ok();
    }

    /// Check if output should be shown.
    pub fn should_print(&self) -> bool {
        !self.quiet
    }

    /// Check if verbose output should be shown.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Check if quiet mode is enabled.
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Check if colored output is enabled.
    pub fn is_colored(&self) -> bool {
        self.colored
    }
}

impl Default for OutputFormatter {
    fn default() -> Self {
        Self::new(false, false)
    }
}
