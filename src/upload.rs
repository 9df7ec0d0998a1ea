//! Per-file upload pipeline.
//!
//! Each file walks `Discovered -> MetadataRead -> LinkResolved | LinkSkipped
//! -> ContentRead -> Uploaded`. Any step can end the file early; the failure
//! is captured as a `FileError` and turned into that file's `UploadOutcome`,
//! so nothing a single file does can stop the batch.

use crate::error::FileError;
use crate::mapping::MappingTable;
use crate::model::{ArtifactLink, AttachmentRecord, FileStage, UploadOutcome, UploadStatus};
use crate::remote::RemoteService;
use crate::report::ResultReporter;
use crate::resolver::{ArtifactResolver, Resolution};
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

/// The server stores attachment sizes as a 32-bit integer.
pub const DEFAULT_MAX_FILE_SIZE: u64 = i32::MAX as u64;

pub struct Uploader<'a> {
    service: &'a dyn RemoteService,
    mapping: &'a MappingTable,
    max_file_size: u64,
}

// What is known about a file so far.
struct FileProgress {
    file_name: String,
    size_bytes: u64,
    stage: FileStage,
    linked_artifact: Option<ArtifactLink>,
    warnings: Vec<String>,
}

impl<'a> Uploader<'a> {
    pub fn new(service: &'a dyn RemoteService, mapping: &'a MappingTable) -> Self {
        Self {
            service,
            mapping,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    pub fn with_max_file_size(mut self, limit: u64) -> Self {
        self.max_file_size = limit;
        self
    }

    /// Run one file through the pipeline. Always produces an outcome.
    pub fn process_file(&self, path: &Path) -> UploadOutcome {
        let mut progress = FileProgress {
            file_name: base_name(path),
            size_bytes: 0,
            stage: FileStage::Discovered,
            linked_artifact: None,
            warnings: Vec::new(),
        };

        let result = self.upload(path, &mut progress);

        let (status, attachment_id, error) = match result {
            Ok(id) => (UploadStatus::Success, Some(id), None),
            Err(err @ FileError::FileTooLarge { .. }) => (UploadStatus::Skipped, None, Some(err)),
            Err(err) => (UploadStatus::Failed, None, Some(err)),
        };
        match &error {
            Some(err) => debug!(file = %progress.file_name, stage = ?progress.stage, kind = err.kind(), error = %err, "File not uploaded"),
            None => debug!(file = %progress.file_name, attachment_id, "File uploaded"),
        }

        UploadOutcome {
            file_name: progress.file_name,
            path: path.to_path_buf(),
            size_bytes: progress.size_bytes,
            status,
            error_kind: error.as_ref().map(FileError::kind),
            error_message: error.as_ref().map(ToString::to_string),
            attachment_id,
            linked_artifact: progress.linked_artifact,
            stage: progress.stage,
            warnings: progress.warnings,
        }
    }

    fn upload(&self, path: &Path, progress: &mut FileProgress) -> Result<i64, FileError> {
        let metadata = fs::metadata(path)?;
        progress.size_bytes = metadata.len();
        progress.stage = FileStage::MetadataRead;

        if progress.size_bytes > self.max_file_size {
            return Err(FileError::FileTooLarge {
                size: progress.size_bytes,
                limit: self.max_file_size,
            });
        }

        progress.linked_artifact = self.resolve_link(progress)?;
        progress.stage = if progress.linked_artifact.is_some() {
            FileStage::LinkResolved
        } else {
            FileStage::LinkSkipped
        };

        // Whole file in memory, the server takes the content in one request.
        let content = fs::read(path)?;
        progress.size_bytes = content.len() as u64;
        progress.stage = FileStage::ContentRead;
        if content.len() <= 1 {
            return Err(FileError::FileEmpty);
        }

        let record = AttachmentRecord {
            file_name: progress.file_name.clone(),
            size_bytes: progress.size_bytes,
            upload_timestamp: Utc::now(),
            linked_artifact: progress.linked_artifact,
        };
        let attachment_id = self
            .service
            .add_file(&record, &content)
            .map_err(FileError::Transport)?;
        progress.stage = FileStage::Uploaded;
        Ok(attachment_id)
    }

    fn resolve_link(&self, progress: &mut FileProgress) -> Result<Option<ArtifactLink>, FileError> {
        let (Some(entry), Some(field)) = (
            self.mapping.find(&progress.file_name),
            self.mapping.custom_property_field(),
        ) else {
            return Ok(None);
        };

        let resolver = ArtifactResolver::new(self.service, field);
        match resolver.resolve(entry).map_err(FileError::ArtifactResolution)? {
            Resolution::Linked(link) => Ok(Some(link)),
            Resolution::NotFound => {
                progress.warnings.push(format!(
                    "No artifact found with {} = {}, uploading unlinked",
                    field, entry.external_key
                ));
                Ok(None)
            }
            Resolution::Unsupported(type_id) => {
                debug!(file = %progress.file_name, type_id, "Unsupported mapped artifact type");
                progress.warnings.push(format!(
                    "Only incident mapped artifacts currently supported, so ignoring the mapped artifacts of type: {type_id}"
                ));
                Ok(None)
            }
        }
    }

    /// Process `files` one at a time until they run out or `cancel` is set.
    ///
    /// The flag is checked before each file is pulled, so an upload already in
    /// flight finishes and is recorded; no further paths are requested.
    pub fn run_batch<I, F>(&self, files: I, cancel: &AtomicBool, mut on_outcome: F) -> ResultReporter
    where
        I: IntoIterator<Item = PathBuf>,
        F: FnMut(&UploadOutcome),
    {
        let mut reporter = ResultReporter::new();
        let mut files = files.into_iter();
        info!("Import started");
        loop {
            if cancel.load(Ordering::SeqCst) {
                info!(processed = reporter.outcomes().len(), "Import cancelled");
                break;
            }
            let Some(path) = files.next() else {
                break;
            };
            let outcome = self.process_file(&path);
            on_outcome(&outcome);
            reporter.record(outcome);
        }
        let summary = reporter.summarize();
        info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = summary.skipped,
            "Import finished"
        );
        reporter
    }
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}
