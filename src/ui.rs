// UI layer: console output for an import run, using `dialoguer` for the
// password prompt and an `indicatif` spinner while files upload.

use crate::model::{UploadOutcome, UploadStatus};
use crate::report::Summary;
use anyhow::Result;
use dialoguer::Password;
use indicatif::{ProgressBar, ProgressStyle};

/// Ask for the password when it was not passed on the command line.
pub fn prompt_password(user: &str) -> Result<String> {
    let password = Password::new()
        .with_prompt(format!("Password or API key for {user}"))
        .interact()?;
    Ok(password)
}

/// Size with decimal units: `512b`, `12Kb`, `3Mb`, `1Gb`.
pub fn format_size(bytes: u64) -> String {
    if bytes >= 1_000_000_000 {
        format!("{}Gb", bytes / 1_000_000_000)
    } else if bytes >= 1_000_000 {
        format!("{}Mb", bytes / 1_000_000)
    } else if bytes >= 1_000 {
        format!("{}Kb", bytes / 1_000)
    } else {
        format!("{}b", bytes)
    }
}

/// `name (size)`, with ` - Error. (Kind)` appended when the file did not upload.
pub fn outcome_line(outcome: &UploadOutcome) -> String {
    let mut line = format!("{} ({})", outcome.file_name, format_size(outcome.size_bytes));
    match (outcome.status, outcome.error_kind) {
        (UploadStatus::Failed, Some(kind)) => line.push_str(&format!(" - Error. ({kind})")),
        (UploadStatus::Skipped, Some(kind)) => line.push_str(&format!(" - Skipped. ({kind})")),
        _ => {}
    }
    line
}

pub fn summary_line(summary: &Summary, cancelled: bool) -> String {
    let mut line = format!(
        "{} files processed: {} uploaded, {} failed, {} skipped.",
        summary.total, summary.succeeded, summary.failed, summary.skipped
    );
    if cancelled {
        line.push_str(" Import was cancelled before all files were processed.");
    }
    line
}

/// Console for one import run. Failures and warnings are always printed;
/// successful files only in verbose mode.
pub struct Console {
    verbose: bool,
    spinner: ProgressBar,
}

impl Console {
    pub fn new(verbose: bool) -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        Console { verbose, spinner }
    }

    // Print above the spinner; also works when stdout is not a terminal.
    fn emit(&self, line: &str) {
        self.spinner.suspend(|| println!("{line}"));
    }

    pub fn say(&self, message: &str) {
        self.emit(message);
    }

    pub fn detail(&self, message: &str) {
        if self.verbose {
            self.emit(message);
        }
    }

    pub fn file_done(&self, outcome: &UploadOutcome) {
        for warning in &outcome.warnings {
            self.emit(&format!("Warning: {warning}"));
        }
        if outcome.status != UploadStatus::Success || self.verbose {
            self.emit(&outcome_line(outcome));
        }
        self.spinner.set_message(format!("Processed {}", outcome.file_name));
        self.spinner.tick();
    }

    pub fn finish(&self, summary: &Summary, cancelled: bool) {
        self.spinner.finish_and_clear();
        println!("{}", summary_line(summary, cancelled));
    }
}
