use std::fmt::Write as _;

use crate::batch::{BatchSummary, ConversionStatus};

/// Render a batch summary as a human-readable report.
///
/// A pure projection of the summary: totals first, then one line per
/// outcome in batch order. Deterministic for a given summary.
pub fn render_summary(summary: &BatchSummary) -> String {
    let mut out = String::new();

    let _ = write!(
        out,
        "{} discovered, {} converted, {} skipped",
        summary.discovered(),
        summary.converted(),
        summary.skipped(),
    );
    if summary.planned() > 0 {
        let _ = write!(out, ", {} planned", summary.planned());
    }
    let _ = writeln!(out, ", {} failed", summary.failed());

    for outcome in &summary.outcomes {
        let _ = write!(
            out,
            "  {} -> {}",
            outcome.source.display(),
            outcome.dest.display()
        );
        match &outcome.status {
            ConversionStatus::Converted {
                events,
                malformed_lines,
            } => {
                let _ = write!(out, " ({events} events");
                if *malformed_lines > 0 {
                    let _ = write!(out, ", {malformed_lines} malformed lines skipped");
                }
                let _ = writeln!(out, ")");
            }
            ConversionStatus::SkippedExists => {
                let _ = writeln!(out, " [skipped: exists]");
            }
            ConversionStatus::DryRun => {
                let _ = writeln!(out, " [dry-run]");
            }
            ConversionStatus::Failed { error } => {
                let _ = writeln!(out, " [error: {error}]");
            }
        }
    }

    out
}

/// Print the report to stdout. Convenience over [`render_summary`].
pub fn print_summary(summary: &BatchSummary) {
    print!("{}", render_summary(summary));
}
