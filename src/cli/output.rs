//! Output formatting module for Stackform
//!
//! Provides colored human output and line-delimited JSON for scripting.

use colored::Colorize;
use serde::Serialize;
use std::io::{self, Write};
use std::time::{Duration, Instant};

use stackform::checks::Severity;

/// Status of one reported item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Passed or written
    Ok,
    /// Reported but not fatal
    Warning,
    /// Fatal
    Error,
}

impl Status {
    /// Get the colored string representation
    pub fn colored_string(&self) -> String {
        match self {
            Status::Ok => "ok".green().to_string(),
            Status::Warning => "warning".yellow().to_string(),
            Status::Error => "error".red().bold().to_string(),
        }
    }

    /// Get the plain string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::Warning => "warning",
            Status::Error => "error",
        }
    }
}

impl From<Severity> for Status {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Warning => Status::Warning,
            Severity::Error => Status::Error,
        }
    }
}

/// Output formatter for different output modes
pub struct OutputFormatter {
    /// Use colored output
    use_color: bool,
    /// JSON output mode
    json_mode: bool,
    /// Verbosity level
    verbosity: u8,
    /// Start time for duration calculations
    start_time: Instant,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(use_color: bool, json_mode: bool, verbosity: u8) -> Self {
        // Respect NO_COLOR environment variable
        let use_color = use_color && std::env::var("NO_COLOR").is_err();
        if !use_color {
            colored::control::set_override(false);
        }

        Self {
            use_color,
            json_mode,
            verbosity,
            start_time: Instant::now(),
        }
    }

    /// Check if JSON output is active
    pub fn is_json(&self) -> bool {
        self.json_mode
    }

    /// Print a banner/header
    pub fn banner(&self, title: &str) {
        if self.json_mode {
            return;
        }

        let line = "=".repeat(title.len() + 4);
        if self.use_color {
            println!("\n{}", line.bright_blue());
            println!("{}", format!("  {}  ", title).bright_blue().bold());
            println!("{}\n", line.bright_blue());
        } else {
            println!("\n{}", line);
            println!("  {}  ", title);
            println!("{}\n", line);
        }
    }

    /// Print a section header
    pub fn section(&self, title: &str) {
        if self.json_mode {
            return;
        }

        if self.use_color {
            println!("\n{}", title.cyan().bold());
            println!("{}", "-".repeat(title.len()).cyan());
        } else {
            println!("\n{}", title);
            println!("{}", "-".repeat(title.len()));
        }
    }

    /// Print one status line: `subject: status message`
    pub fn status(&self, subject: &str, status: Status, message: &str) {
        if self.json_mode {
            return;
        }

        let label = if self.use_color {
            status.colored_string()
        } else {
            status.as_str().to_string()
        };
        if message.is_empty() {
            println!("{}: [{}]", subject, label);
        } else {
            println!("{}: [{}] {}", subject, label, message);
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.json_mode {
            self.event("error", message);
            return;
        }

        if self.use_color {
            eprintln!("{} {}", "ERROR:".red().bold(), message);
        } else {
            eprintln!("ERROR: {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.json_mode {
            self.event("warning", message);
            return;
        }

        if self.use_color {
            eprintln!("{} {}", "WARNING:".yellow().bold(), message);
        } else {
            eprintln!("WARNING: {}", message);
        }
    }

    /// Print a hint message
    pub fn hint(&self, message: &str) {
        if self.json_mode {
            self.event("hint", message);
            return;
        }

        if self.use_color {
            eprintln!("{} {}", "HINT:".cyan().bold(), message);
        } else {
            eprintln!("HINT: {}", message);
        }
    }

    /// Print an info message (respects verbosity)
    pub fn info(&self, message: &str) {
        if self.verbosity < 1 || self.json_mode {
            return;
        }

        if self.use_color {
            println!("{} {}", "INFO:".blue(), message);
        } else {
            println!("INFO: {}", message);
        }
    }

    /// Print a debug message (requires higher verbosity)
    pub fn debug(&self, message: &str) {
        if self.verbosity < 2 || self.json_mode {
            return;
        }

        if self.use_color {
            println!("{} {}", "DEBUG:".magenta(), message);
        } else {
            println!("DEBUG: {}", message);
        }
    }

    /// Print raw text to stdout (always shows)
    pub fn plain(&self, message: &str) {
        println!("{}", message);
    }

    /// Print a value as pretty JSON to stdout
    pub fn json<T: Serialize>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{}", json),
            Err(e) => self.error(&format!("Failed to serialize output: {}", e)),
        }
    }

    /// Print a list of items
    pub fn list(&self, title: &str, items: &[String]) {
        if self.json_mode {
            return;
        }

        if self.use_color {
            println!("\n{}:", title.bright_white().bold());
        } else {
            println!("\n{}:", title);
        }

        for item in items {
            if self.use_color {
                println!("  {} {}", "-".bright_black(), item);
            } else {
                println!("  - {}", item);
            }
        }
    }

    /// Print a table
    pub fn table(&self, headers: &[&str], rows: &[Vec<String>]) {
        if self.json_mode {
            return;
        }

        // Calculate column widths
        let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
        for row in rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.len());
                }
            }
        }

        let header_line = join_cells(headers.iter().copied(), &widths);
        if self.use_color {
            println!("{}", header_line.bright_white().bold());
        } else {
            println!("{}", header_line);
        }

        let sep: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        if self.use_color {
            println!("{}", sep.join("-+-").bright_black());
        } else {
            println!("{}", sep.join("-+-"));
        }

        for row in rows {
            println!("{}", join_cells(row.iter().map(String::as_str), &widths));
        }
    }

    /// Print how long the command took
    pub fn elapsed(&self, what: &str) {
        if self.json_mode {
            return;
        }

        let took = format_duration(self.start_time.elapsed());
        if self.use_color {
            println!("\n{} in {}", what.green().bold(), took);
        } else {
            println!("\n{} in {}", what, took);
        }
    }

    /// Flush stdout
    pub fn flush(&self) {
        let _ = io::stdout().flush();
    }

    fn event(&self, kind: &str, message: &str) {
        let event = serde_json::json!({
            "type": kind,
            "message": message
        });
        eprintln!("{}", event);
    }
}

fn join_cells<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let mut line = String::new();
    for (i, (cell, width)) in cells.zip(widths).enumerate() {
        if i > 0 {
            line.push_str(" | ");
        }
        line.push_str(&format!("{:width$}", cell, width = *width));
    }
    line.trim_end().to_string()
}

/// Format a duration as a human-readable string
fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs > 0 {
        format!("{}.{:03}s", secs, millis)
    } else {
        format!("{}ms", millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        assert_eq!(Status::Ok.as_str(), "ok");
        assert_eq!(Status::Warning.as_str(), "warning");
        assert_eq!(Status::Error.as_str(), "error");
        assert!(Status::Error.colored_string().contains("error"));
    }

    #[test]
    fn test_status_from_severity() {
        assert_eq!(Status::from(Severity::Warning), Status::Warning);
        assert_eq!(Status::from(Severity::Error), Status::Error);
    }

    #[test]
    fn test_join_cells_pads_columns() {
        let line = join_cells(["a", "bb"].into_iter(), &[3, 2]);
        assert_eq!(line, "a   | bb");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(500)), "500ms");
        assert_eq!(format_duration(Duration::from_secs(5)), "5.000s");
        assert_eq!(format_duration(Duration::from_secs(65)), "1m 5s");
    }
}
