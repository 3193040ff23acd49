//! Writing responses and status lines
//!
//! Responses are printed as JSON, pretty JSON, YAML, or in the human
//! format, which is pretty JSON under a colored heading. Status lines only
//! appear in the human format.

use crate::cli::OutputFormat;
use crate::error::Result;
use colored::Colorize;
use is_terminal::IsTerminal;
use serde::Serialize;
use std::io::{self, Write};
use tracing::trace;

/// Renders a serializable value in one output format
pub trait OutputFormatter {
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        let text = match self {
            OutputFormat::Json => serde_json::to_string(value)?,
            OutputFormat::JsonPretty | OutputFormat::Human => serde_json::to_string_pretty(value)?,
            OutputFormat::Yaml => serde_yaml::to_string(value)?,
        };
        Ok(text)
    }
}

#[derive(Clone, Copy)]
enum Notice {
    Info,
    Success,
    Warning,
    Heading,
}

impl Notice {
    /// Warnings still show in quiet mode
    fn silenced_by_quiet(self) -> bool {
        !matches!(self, Notice::Warning)
    }

    fn render(self, message: &str, color: bool) -> String {
        match (self, color) {
            (Notice::Info, true) => format!("{} {}", "ℹ".blue(), message),
            (Notice::Info, false) => format!("INFO: {}", message),
            (Notice::Success, true) => message.green().to_string(),
            (Notice::Success, false) => message.to_string(),
            (Notice::Warning, true) => message.yellow().to_string(),
            (Notice::Warning, false) => format!("WARNING: {}", message),
            (Notice::Heading, true) => format!("═══ {} ═══", message).bright_blue().to_string(),
            (Notice::Heading, false) => format!("=== {} ===", message),
        }
    }
}

pub struct OutputWriter {
    format: OutputFormat,
    color: bool,
    quiet: bool,
    sink: Box<dyn Write>,
}

impl OutputWriter {
    /// Write to stdout; color is dropped when stdout is not a terminal
    pub fn new(format: OutputFormat, color: bool, quiet: bool) -> Self {
        let color = color && io::stdout().is_terminal();
        Self::with_writer(format, color, quiet, Box::new(io::stdout()))
    }

    pub fn with_writer(format: OutputFormat, color: bool, quiet: bool, sink: Box<dyn Write>) -> Self {
        Self {
            format,
            color,
            quiet,
            sink,
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    fn human(&self) -> bool {
        self.format == OutputFormat::Human
    }

    pub fn write(&mut self, content: &str) -> Result<()> {
        self.sink.write_all(content.as_bytes())?;
        self.sink.flush()?;
        Ok(())
    }

    pub fn writeln(&mut self, content: &str) -> Result<()> {
        self.write(content)?;
        self.write("\n")
    }

    fn notice(&mut self, kind: Notice, message: &str) -> Result<()> {
        if !self.human() || (self.quiet && kind.silenced_by_quiet()) {
            return Ok(());
        }
        let line = kind.render(message, self.color);
        self.writeln(&line)
    }

    pub fn info(&mut self, message: &str) -> Result<()> {
        self.notice(Notice::Info, message)
    }

    pub fn success(&mut self, message: &str) -> Result<()> {
        self.notice(Notice::Success, message)
    }

    pub fn warning(&mut self, message: &str) -> Result<()> {
        self.notice(Notice::Warning, message)
    }

    pub fn section(&mut self, title: &str) -> Result<()> {
        self.notice(Notice::Heading, title)
    }

    /// A value in the configured format; never silenced
    pub fn data<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let mut text = self.format.format(value)?;
        trace!(bytes = text.len(), "Writing data");

        if !text.ends_with('\n') {
            text.push('\n');
        }
        self.write(&text)
    }

    /// Two left-aligned columns (human format only)
    pub fn table(&mut self, headers: [&str; 2], rows: &[(String, String)]) -> Result<()> {
        if !self.human() {
            return Ok(());
        }

        let width = rows
            .iter()
            .map(|(key, _)| key.len())
            .fold(headers[0].len(), usize::max);

        let heading = format!("{:width$}  {}", headers[0], headers[1]);
        let heading = if self.color {
            heading.bold().to_string()
        } else {
            heading
        };
        self.writeln(&heading)?;

        for (key, value) in rows {
            self.writeln(&format!("{:width$}  {}", key, value))?;
        }
        Ok(())
    }
}
