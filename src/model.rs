// Data shapes shared by the import pipeline and the remote client.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

/// Spira artifact type id for incidents.
pub const INCIDENT_TYPE_ID: i32 = 3;

/// Artifact types the importer knows how to link attachments to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactType {
    Incident,
}

impl ArtifactType {
    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            INCIDENT_TYPE_ID => Some(ArtifactType::Incident),
            _ => None,
        }
    }

    pub fn id(self) -> i32 {
        match self {
            ArtifactType::Incident => INCIDENT_TYPE_ID,
        }
    }

    /// Property the remote service sorts this artifact type's primary key by.
    pub fn id_property(self) -> &'static str {
        match self {
            ArtifactType::Incident => "IncidentId",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArtifactLink {
    pub artifact_type_id: i32,
    pub artifact_id: i64,
}

/// Metadata sent along with a file's bytes.
#[derive(Debug, Clone)]
pub struct AttachmentRecord {
    pub file_name: String,
    pub size_bytes: u64,
    pub upload_timestamp: DateTime<Utc>,
    pub linked_artifact: Option<ArtifactLink>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UploadStatus {
    Success,
    Skipped,
    Failed,
}

/// Furthest pipeline step a file reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileStage {
    Discovered,
    MetadataRead,
    LinkResolved,
    LinkSkipped,
    ContentRead,
    Uploaded,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadOutcome {
    pub file_name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub status: UploadStatus,
    pub error_kind: Option<&'static str>,
    pub error_message: Option<String>,
    pub attachment_id: Option<i64>,
    pub linked_artifact: Option<ArtifactLink>,
    pub stage: FileStage,
    pub warnings: Vec<String>,
}

impl UploadOutcome {
    pub fn is_failed(&self) -> bool {
        self.status == UploadStatus::Failed
    }
}
