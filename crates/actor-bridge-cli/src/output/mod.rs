mod formatters;
mod theme;

pub use formatters::*;
pub use theme::*;

use console::Term;

use crate::config::OutputConfig;
use crate::error::{CliError, CliResult};

/// Main output handler for the CLI
#[derive(Debug)]
pub struct OutputManager {
    config: OutputConfig,
    term: Term,
    theme: Theme,
}

impl OutputManager {
    pub fn new(config: OutputConfig) -> Self {
        let term = Term::stdout();
        let theme = Theme::new(config.colors && term.features().colors_supported());

        Self {
            config,
            term,
            theme,
        }
    }

    pub fn success(&self, message: &str) -> CliResult<()> {
        println!("{} {}", self.theme.marker(Tone::Success), message);
        Ok(())
    }

    /// Errors go to stderr
    pub fn error(&self, message: &str) -> CliResult<()> {
        eprintln!("{} {}", self.theme.marker(Tone::Error).for_stderr(), message);
        Ok(())
    }

    pub fn warning(&self, message: &str) -> CliResult<()> {
        println!("{} {}", self.theme.marker(Tone::Warning), message);
        Ok(())
    }

    pub fn info(&self, message: &str) -> CliResult<()> {
        println!("{} {}", self.theme.marker(Tone::Info), message);
        Ok(())
    }

    /// Print `data` in `format`, or the configured default format
    pub fn output<T>(&self, data: &T, format: Option<&str>) -> CliResult<()>
    where
        T: serde::Serialize + OutputFormat,
    {
        let format = format.unwrap_or(&self.config.default_format);

        match format {
            "json" => {
                let json = serde_json::to_string_pretty(data)?;
                println!("{}", json);
            }
            "compact" => data.format_compact(self)?,
            "pretty" => data.format_pretty(self)?,
            "table" => data.format_table(self)?,
            _ => {
                return Err(CliError::invalid_input(
                    "format",
                    format,
                    "Supported formats: json, compact, pretty, table",
                ));
            }
        }

        Ok(())
    }

    pub fn term(&self) -> &Term {
        &self.term
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn config(&self) -> &OutputConfig {
        &self.config
    }

    /// Print a table with headers and rows
    pub fn table(&self, headers: &[&str], rows: &[Vec<String>]) -> CliResult<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let widths = column_widths(headers, rows);

        let header_line: Vec<String> = headers
            .iter()
            .zip(&widths)
            .map(|(header, width)| {
                self.theme
                    .column_header()
                    .apply_to(format!("{:width$}", header, width = width))
                    .to_string()
            })
            .collect();
        println!("│ {} │", header_line.join(" │ "));

        let separator: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
        println!("├{}┤", separator.join("┼"));

        for row in rows {
            println!("│ {} │", format_row(row, &widths).join(" │ "));
        }

        Ok(())
    }
}

fn column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }
    widths
}

fn format_row(row: &[String], widths: &[usize]) -> Vec<String> {
    widths
        .iter()
        .enumerate()
        .map(|(i, width)| {
            let cell = row.get(i).map(String::as_str).unwrap_or("");
            format!("{:width$}", cell, width = width)
        })
        .collect()
}

/// Trait for types that can be formatted in different ways
pub trait OutputFormat {
    fn format_compact(&self, output: &OutputManager) -> CliResult<()>;
    fn format_pretty(&self, output: &OutputManager) -> CliResult<()>;
    fn format_table(&self, output: &OutputManager) -> CliResult<()>;
}
