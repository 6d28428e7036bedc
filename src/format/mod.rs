//! Output formatting for harvest results (JSON, table, markdown, CSV).

use crate::amazon::models::{HarvestResponse, HarvestStatus, ReviewRecord};
use crate::config::OutputFormat;

/// Formats harvest responses for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a harvest response.
    pub fn format_response(&self, response: &HarvestResponse) -> String {
        match self.format {
            OutputFormat::Json => self.json(response),
            OutputFormat::Table => self.table(response),
            OutputFormat::Markdown => self.markdown(response),
            OutputFormat::Csv => self.csv(&response.reviews),
        }
    }

    /// Returns true if the rendering includes the status and message.
    ///
    /// CSV carries reviews only; callers report the status separately.
    pub fn carries_status(&self) -> bool {
        !matches!(self.format, OutputFormat::Csv)
    }

    /// One-line summary of a response, e.g. `[partial] Stopped after ...`.
    pub fn status_line(&self, response: &HarvestResponse) -> String {
        format!("[{}] {}", status_label(response.status), response.message)
    }

    // JSON formatting

    fn json(&self, response: &HarvestResponse) -> String {
        serde_json::to_string_pretty(response).unwrap_or_else(|_| "{}".to_string())
    }

    // Table formatting

    fn table(&self, response: &HarvestResponse) -> String {
        let mut lines = Vec::new();

        for (i, review) in response.reviews.iter().enumerate() {
            if i > 0 {
                lines.push(format!("{:-<60}", ""));
            }
            lines.push(format!("Title:   {}", review.title.trim()));
            lines.push(format!("Date:    {}", review.date.trim()));
            lines.push(format!("Author:  {}", review.author.trim()));
            lines.push(String::new());
            lines.push(review.body.trim().to_string());
        }

        if !response.reviews.is_empty() {
            lines.push(String::new());
        }
        lines.push(self.status_line(response));

        lines.join("\n")
    }

    // Markdown formatting

    fn markdown(&self, response: &HarvestResponse) -> String {
        let mut lines = Vec::new();

        for review in &response.reviews {
            lines.push(format!("## {}", review.title.trim()));
            lines.push(String::new());
            lines.push(format!("*{}* by **{}**", review.date.trim(), review.author.trim()));
            lines.push(String::new());
            for line in review.body.trim().lines() {
                lines.push(format!("> {}", line.trim()));
            }
            lines.push(String::new());
        }

        lines.push(format!("*{}*", response.message));

        lines.join("\n")
    }

    // CSV formatting

    fn csv_header(&self) -> String {
        "title,date,author,body".to_string()
    }

    fn csv(&self, reviews: &[ReviewRecord]) -> String {
        let mut lines = Vec::new();
        lines.push(self.csv_header());

        for review in reviews {
            lines.push(format!(
                "{},{},{},{}",
                Self::csv_escape(&review.title),
                Self::csv_escape(&review.date),
                Self::csv_escape(&review.author),
                Self::csv_escape(&review.body)
            ));
        }

        lines.join("\n")
    }

    fn csv_escape(s: &str) -> String {
        if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
            format!("\"{}\"", s.replace('"', "\"\""))
        } else {
            s.to_string()
        }
    }
}

fn status_label(status: HarvestStatus) -> &'static str {
    match status {
        HarvestStatus::Ok => "ok",
        HarvestStatus::Partial => "partial",
        HarvestStatus::Error => "error",
    }
}
