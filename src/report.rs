//! Collects per-file outcomes for the end-of-run summary.

use crate::model::{UploadOutcome, UploadStatus};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: Summary,
    outcomes: &'a [UploadOutcome],
}

/// Outcomes in the order they were produced.
#[derive(Debug, Default)]
pub struct ResultReporter {
    outcomes: Vec<UploadOutcome>,
}

impl ResultReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: UploadOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn summarize(&self) -> Summary {
        self.outcomes
            .iter()
            .fold(Summary::default(), |mut summary, outcome| {
                summary.total += 1;
                match outcome.status {
                    UploadStatus::Success => summary.succeeded += 1,
                    UploadStatus::Failed => summary.failed += 1,
                    UploadStatus::Skipped => summary.skipped += 1,
                }
                summary
            })
    }

    pub fn outcomes(&self) -> &[UploadOutcome] {
        &self.outcomes
    }

    pub fn failures(&self) -> impl Iterator<Item = &UploadOutcome> {
        self.outcomes.iter().filter(|o| o.is_failed())
    }

    /// Write the summary and every outcome to `path` as pretty JSON.
    pub fn write_json(&self, path: &Path) -> io::Result<()> {
        let report = JsonReport {
            summary: self.summarize(),
            outcomes: &self.outcomes,
        };
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, &report)?;
        writer.flush()
    }
}
