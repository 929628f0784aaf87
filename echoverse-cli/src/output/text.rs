//! Plain text output formatter

use super::{AnalysisReport, OutputFormatter};
use anyhow::Result;
use std::io::{self, Write};

/// Human-readable report, one block per document
pub struct TextFormatter<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> TextFormatter<W> {
    /// Create a new text formatter
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }
}

impl TextFormatter<io::Stdout> {
    /// Create a formatter that writes to stdout
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send + Sync> OutputFormatter for TextFormatter<W> {
    fn format_analysis(&mut self, report: &AnalysisReport) -> Result<()> {
        if self.written > 0 {
            writeln!(self.writer)?;
        }
        self.written += 1;

        let m = &report.metrics;
        let d = &report.decision;
        writeln!(self.writer, "== {} ==", report.source)?;
        writeln!(
            self.writer,
            "Length: {} chars, {} words, {} sentences, {} paragraphs",
            m.length, m.word_count, m.sentence_count, m.paragraph_count
        )?;
        writeln!(self.writer, "Complexity: {:.2}", m.complexity_score)?;
        writeln!(
            self.writer,
            "Strategy: {} (base {}), ~{:.1}s, quality {:.2}, speed {:.2}",
            d.strategy, d.base_strategy, d.estimated_time, d.quality_score, d.speed_score
        )?;
        writeln!(
            self.writer,
            "Model: {}, max tokens {}, {} worker(s)",
            if d.uses_model { "yes" } else { "no" },
            d.max_tokens,
            d.concurrency
        )?;
        writeln!(
            self.writer,
            "Chunks: {} via {} route",
            report.spans.len(),
            report.route
        )?;
        for span in &report.spans {
            let marker = if span.starts_paragraph { "¶" } else { " " };
            writeln!(
                self.writer,
                "  {marker}{:>3} [{:<9}] {:>4}  {}",
                span.index,
                span.kind.as_str(),
                span.chars,
                span.preview
            )?;
        }
        if let Some(budget) = &report.budget {
            let r = &budget.recommendation;
            writeln!(
                self.writer,
                "Within {:.1}s budget (recommended {}, ~{:.1}s):",
                budget.seconds, r.recommended, r.estimated_time
            )?;
            if r.alternatives.is_empty() {
                writeln!(self.writer, "  no strategy fits")?;
            }
            for alt in &r.alternatives {
                writeln!(
                    self.writer,
                    "  {:<12} ~{:.1}s  quality {:.2}",
                    alt.strategy.name(),
                    alt.estimated_time,
                    alt.quality_score
                )?;
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
