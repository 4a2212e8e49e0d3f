//! Decision and fill journal.
//!
//! Every line has the form `<ISO date>, <message>`. Lines are kept in memory
//! for the host to persist and are mirrored to `tracing` at info level.

use chrono::NaiveDate;

pub const JOURNAL_TARGET: &str = "tradebot::journal";

#[derive(Debug, Clone, Default)]
pub struct Journal {
    lines: Vec<String>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, date: NaiveDate, message: impl AsRef<str>) {
        let line = format_line(date, message.as_ref());
        tracing::info!(target: JOURNAL_TARGET, "{line}");
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

pub fn format_line(date: NaiveDate, message: &str) -> String {
    format!("{}, {message}", date.format("%Y-%m-%d"))
}
