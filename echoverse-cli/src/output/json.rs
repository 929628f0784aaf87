//! JSON output formatter

use super::{AnalysisReport, OutputFormatter};
use anyhow::Result;
use std::io::Write;

/// JSON formatter - outputs reports as a JSON array
pub struct JsonFormatter<W: Write> {
    writer: W,
    reports: Vec<AnalysisReport>,
}

impl<W: Write> JsonFormatter<W> {
    /// Create a new JSON formatter
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            reports: Vec::new(),
        }
    }
}

impl<W: Write + Send + Sync> OutputFormatter for JsonFormatter<W> {
    fn format_analysis(&mut self, report: &AnalysisReport) -> Result<()> {
        self.reports.push(report.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.writer, &self.reports)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}
