use std::io::Write;

use crate::models::RunSummary;
use crate::render::EntryOutcome;

// Console output is best effort: a closed stdout does not stop the run.
pub struct Progress<W: Write> {
    out: W,
    total: usize,
    width: usize,
    succeeded: usize,
    failed: usize,
}

impl<W: Write> Progress<W> {
    pub fn new(out: W, total: usize, width: usize) -> Self {
        Self {
            out,
            total,
            width,
            succeeded: 0,
            failed: 0,
        }
    }

    pub fn entry(&mut self, outcome: &EntryOutcome) {
        let counter = format!(
            "[{:0width$}/{}]",
            outcome.index,
            self.total,
            width = self.width
        );
        match &outcome.result {
            Ok(()) => {
                self.succeeded += 1;
                let _ = writeln!(self.out, "  ✅ {} {}", counter, outcome.filename);
            }
            Err(e) => {
                self.failed += 1;
                let _ = writeln!(self.out, "  ❌ {} {}: {}", counter, outcome.filename, e);
            }
        }
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            total: self.succeeded + self.failed,
            succeeded: self.succeeded,
            failed: self.failed,
        }
    }

    pub fn finish(mut self) -> RunSummary {
        let summary = self.summary();
        let _ = writeln!(
            self.out,
            "\n{} succeeded, {} failed ({} total)",
            summary.succeeded, summary.failed, summary.total
        );
        let _ = self.out.flush();
        summary
    }
}
