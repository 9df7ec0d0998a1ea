//! The narrow view of the remote service the import pipeline needs.
//!
//! `ApiClient` implements it against a live Spira server; tests plug in an
//! in-memory fake. Session setup (login, project selection) happens before a
//! `RemoteService` is handed to the pipeline.

use crate::error::ServiceError;
use crate::model::{ArtifactType, AttachmentRecord};

/// Equality filter on an artifact property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyFilter {
    pub property_name: String,
    pub string_value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOrder {
    pub property_name: String,
    pub ascending: bool,
}

/// One page of an artifact search. `start_row` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactQuery {
    pub artifact_type: ArtifactType,
    pub filters: Vec<PropertyFilter>,
    pub sort: SortOrder,
    pub start_row: u32,
    pub page_size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteArtifact {
    pub artifact_id: i64,
}

pub trait RemoteService {
    /// Upload one attachment, returning the id the server assigned to it.
    fn add_file(&self, record: &AttachmentRecord, content: &[u8]) -> Result<i64, ServiceError>;

    fn query_artifacts(&self, query: &ArtifactQuery) -> Result<Vec<RemoteArtifact>, ServiceError>;
}
