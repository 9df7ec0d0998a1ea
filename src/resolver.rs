//! Looks up the remote artifact a mapping row points at.

use crate::error::ServiceError;
use crate::mapping::MappingEntry;
use crate::model::{ArtifactLink, ArtifactType};
use crate::remote::{ArtifactQuery, PropertyFilter, RemoteService, SortOrder};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Linked(ArtifactLink),
    /// No artifact carries the external key. The file is uploaded unlinked.
    NotFound,
    /// Artifact type the importer cannot link to; carries the raw type id.
    Unsupported(i32),
}

impl Resolution {
    pub fn link(&self) -> Option<ArtifactLink> {
        match self {
            Resolution::Linked(link) => Some(*link),
            _ => None,
        }
    }
}

pub struct ArtifactResolver<'a> {
    service: &'a dyn RemoteService,
    custom_property_field: &'a str,
}

impl<'a> ArtifactResolver<'a> {
    pub fn new(service: &'a dyn RemoteService, custom_property_field: &'a str) -> Self {
        Self {
            service,
            custom_property_field,
        }
    }

    /// Find the artifact whose custom property holds `entry.external_key`.
    /// When several match, the one with the lowest id wins.
    pub fn resolve(&self, entry: &MappingEntry) -> Result<Resolution, ServiceError> {
        let Some(artifact_type) = ArtifactType::from_id(entry.artifact_type_id) else {
            return Ok(Resolution::Unsupported(entry.artifact_type_id));
        };

        let query = ArtifactQuery {
            artifact_type,
            filters: vec![PropertyFilter {
                property_name: self.custom_property_field.to_string(),
                string_value: entry.external_key.clone(),
            }],
            sort: SortOrder {
                property_name: artifact_type.id_property().to_string(),
                ascending: true,
            },
            start_row: 1,
            page_size: 1,
        };
        let found = self.service.query_artifacts(&query)?;

        let resolution = match found.first() {
            Some(artifact) => Resolution::Linked(ArtifactLink {
                artifact_type_id: artifact_type.id(),
                artifact_id: artifact.artifact_id,
            }),
            None => Resolution::NotFound,
        };
        debug!(key = %entry.external_key, ?resolution, "Resolved mapped artifact");
        Ok(resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AttachmentRecord;
    use crate::remote::RemoteArtifact;
    use std::cell::RefCell;

    struct StubService {
        results: Result<Vec<RemoteArtifact>, u16>,
        queries: RefCell<Vec<ArtifactQuery>>,
    }

    impl StubService {
        fn returning(ids: &[i64]) -> Self {
            Self {
                results: Ok(ids.iter().map(|&artifact_id| RemoteArtifact { artifact_id }).collect()),
                queries: RefCell::new(Vec::new()),
            }
        }
    }

    impl RemoteService for StubService {
        fn add_file(&self, _: &AttachmentRecord, _: &[u8]) -> Result<i64, ServiceError> {
            unreachable!("resolver never uploads")
        }

        fn query_artifacts(&self, query: &ArtifactQuery) -> Result<Vec<RemoteArtifact>, ServiceError> {
            self.queries.borrow_mut().push(query.clone());
            match &self.results {
                Ok(found) => Ok(found.clone()),
                Err(status) => Err(ServiceError::HttpStatus {
                    status: *status,
                    body: String::new(),
                }),
            }
        }
    }

    fn entry(type_id: i32) -> MappingEntry {
        MappingEntry {
            filename: "bug1.png".into(),
            artifact_type_id: type_id,
            external_key: "EXT-42".into(),
        }
    }

    #[test]
    fn test_incident_is_linked() {
        let service = StubService::returning(&[77]);
        let resolver = ArtifactResolver::new(&service, "Custom_03");

        let resolution = resolver.resolve(&entry(3)).unwrap();
        assert_eq!(
            resolution.link(),
            Some(ArtifactLink { artifact_type_id: 3, artifact_id: 77 })
        );

        let queries = service.queries.borrow();
        assert_eq!(queries.len(), 1);
        let q = &queries[0];
        assert_eq!(q.artifact_type, ArtifactType::Incident);
        assert_eq!(q.filters[0].property_name, "Custom_03");
        assert_eq!(q.filters[0].string_value, "EXT-42");
        assert_eq!(q.sort.property_name, "IncidentId");
        assert!(q.sort.ascending);
        assert_eq!((q.start_row, q.page_size), (1, 1));
    }

    #[test]
    fn test_no_match_is_not_an_error() {
        let service = StubService::returning(&[]);
        let resolver = ArtifactResolver::new(&service, "Custom_03");
        assert_eq!(resolver.resolve(&entry(3)).unwrap(), Resolution::NotFound);
    }

    #[test]
    fn test_unsupported_type_skips_lookup() {
        let service = StubService::returning(&[77]);
        let resolver = ArtifactResolver::new(&service, "Custom_03");
        assert_eq!(resolver.resolve(&entry(1)).unwrap(), Resolution::Unsupported(1));
        assert!(service.queries.borrow().is_empty());
    }

    #[test]
    fn test_remote_failure_propagates() {
        let service = StubService {
            results: Err(401),
            queries: RefCell::new(Vec::new()),
        };
        let resolver = ArtifactResolver::new(&service, "Custom_03");
        assert!(matches!(
            resolver.resolve(&entry(3)),
            Err(ServiceError::HttpStatus { status: 401, .. })
        ));
    }
}
