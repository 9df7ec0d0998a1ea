// API client module: a small blocking HTTP client for the Spira REST API.
// It owns the session setup (credential check, project selection) and
// implements `RemoteService` so the import pipeline can search incidents
// and upload documents through it.

use crate::config::ServerConfig;
use crate::error::{ConfigError, ServiceError};
use crate::model::{ArtifactType, AttachmentRecord};
use crate::remote::{ArtifactQuery, RemoteArtifact, RemoteService};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Spira attachment type for uploaded files (as opposed to URLs).
const ATTACHMENT_TYPE_FILE: i32 = 1;

/// Blocking client bound to one Spira project.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    project_id: i64,
}

/// Project summary returned by `GET projects`.
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
pub struct RemoteProject {
    pub project_id: i64,
    #[serde(default)]
    pub name: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "PascalCase")]
pub struct RemoteFilter {
    pub property_name: String,
    pub string_value: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
pub struct RemoteIncident {
    pub incident_id: Option<i64>,
}

#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct RemoteLinkedArtifact {
    pub artifact_type_id: i32,
    pub artifact_id: i64,
}

/// Document plus its content, the body of `POST projects/{id}/documents/file`.
#[derive(Serialize, Debug)]
#[serde(rename_all = "PascalCase")]
pub struct RemoteDocumentFile {
    pub attachment_type_id: i32,
    pub filename_or_url: String,
    pub size: i32,
    #[serde(with = "wcf_date")]
    pub upload_date: chrono::DateTime<chrono::Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attached_artifacts: Vec<RemoteLinkedArtifact>,
    /// Base64 encoded file content.
    pub binary_data: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct RemoteDocumentResponse {
    attachment_id: Option<i64>,
}

// The service expects dates in the WCF JSON form `/Date(<millis>)/`.
mod wcf_date {
    use chrono::{DateTime, Utc};
    use serde::Serializer;

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("/Date({})/", date.timestamp_millis()))
    }
}

impl RemoteDocumentFile {
    pub fn new(record: &AttachmentRecord, content: &[u8]) -> Result<Self, ServiceError> {
        let size = i32::try_from(record.size_bytes).map_err(|_| {
            ServiceError::Encode(format!("{} bytes exceeds the server's size field", record.size_bytes))
        })?;
        Ok(RemoteDocumentFile {
            attachment_type_id: ATTACHMENT_TYPE_FILE,
            filename_or_url: record.file_name.clone(),
            size,
            upload_date: record.upload_timestamp,
            attached_artifacts: record
                .linked_artifact
                .iter()
                .map(|link| RemoteLinkedArtifact {
                    artifact_type_id: link.artifact_type_id,
                    artifact_id: link.artifact_id,
                })
                .collect(),
            binary_data: STANDARD.encode(content),
        })
    }
}

impl ApiClient {
    /// Build a client for `config` without talking to the server.
    pub fn new(config: &ServerConfig) -> Result<Self, ConfigError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let login = HeaderValue::from_str(&config.login).map_err(|_| ConfigError::AuthenticationFailed)?;
        let mut api_key =
            HeaderValue::from_str(&config.api_key).map_err(|_| ConfigError::AuthenticationFailed)?;
        api_key.set_sensitive(true);
        headers.insert("username", login);
        headers.insert("api-key", api_key);

        let client = Client::builder()
            .cookie_store(true)
            .default_headers(headers)
            .build()
            .map_err(|e| ConfigError::ServerUnreachable(format!("Failed to build HTTP client: {e}")))?;
        Ok(ApiClient {
            client,
            base_url: config.base_url.clone(),
            project_id: config.project_id,
        })
    }

    /// Build a client, check the credentials and select the configured project.
    pub fn connect(config: &ServerConfig) -> Result<Self, ConfigError> {
        let api = Self::new(config)?;
        info!(server = %api.base_url, "Connecting to Spira server");
        let projects = api.authenticate()?;

        debug!(project_id = api.project_id, "Selecting Spira project");
        if !projects.iter().any(|p| p.project_id == api.project_id) {
            return Err(ConfigError::ProjectNotFound(api.project_id));
        }
        api.connect_to_project()?;
        Ok(api)
    }

    /// List the projects visible to the configured user. A 401/403 here
    /// means the credentials are wrong.
    fn authenticate(&self) -> Result<Vec<RemoteProject>, ConfigError> {
        let url = self.endpoint("projects").map_err(unreachable_server)?;
        let res = self.client.get(url).send().map_err(|e| unreachable_server(e.into()))?;
        if matches!(res.status(), StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(ConfigError::AuthenticationFailed);
        }
        let res = check_status(res).map_err(unreachable_server)?;
        res.json()
            .map_err(|e| unreachable_server(e.into()))
    }

    fn connect_to_project(&self) -> Result<(), ConfigError> {
        let failed = |_: ServiceError| ConfigError::ProjectConnectFailed(self.project_id);
        let url = self
            .endpoint(&format!("projects/{}", self.project_id))
            .map_err(failed)?;
        let res = self.client.get(url).send().map_err(|e| failed(ServiceError::from(e)))?;
        check_status(res).map_err(failed)?;
        Ok(())
    }

    fn endpoint(&self, path: &str) -> Result<Url, ServiceError> {
        self.base_url
            .join(path)
            .map_err(|e| ServiceError::Transport(format!("bad endpoint '{path}': {e}")))
    }

    /// URL for one page of an artifact search.
    pub fn search_url(&self, query: &ArtifactQuery) -> Result<Url, ServiceError> {
        let collection = match query.artifact_type {
            ArtifactType::Incident => "incidents",
        };
        let mut url = self.endpoint(&format!("projects/{}/{}/search", self.project_id, collection))?;
        url.query_pairs_mut()
            .append_pair("starting_row", &query.start_row.to_string())
            .append_pair("number_of_rows", &query.page_size.to_string())
            .append_pair("sort_field", &query.sort.property_name)
            .append_pair("sort_direction", if query.sort.ascending { "ASC" } else { "DESC" });
        Ok(url)
    }
}

impl RemoteService for ApiClient {
    fn add_file(&self, record: &AttachmentRecord, content: &[u8]) -> Result<i64, ServiceError> {
        let url = self.endpoint(&format!("projects/{}/documents/file", self.project_id))?;
        let body = RemoteDocumentFile::new(record, content)?;
        let res = self.client.post(url).json(&body).send()?;
        let doc: RemoteDocumentResponse = check_status(res)?.json()?;
        doc.attachment_id.ok_or(ServiceError::Rejected)
    }

    fn query_artifacts(&self, query: &ArtifactQuery) -> Result<Vec<RemoteArtifact>, ServiceError> {
        let url = self.search_url(query)?;
        let filters: Vec<RemoteFilter> = query
            .filters
            .iter()
            .map(|f| RemoteFilter {
                property_name: f.property_name.clone(),
                string_value: f.string_value.clone(),
            })
            .collect();
        let res = self.client.post(url).json(&filters).send()?;
        let incidents: Vec<RemoteIncident> = check_status(res)?.json()?;
        Ok(incidents
            .into_iter()
            .filter_map(|i| i.incident_id)
            .map(|artifact_id| RemoteArtifact { artifact_id })
            .collect())
    }
}

/// Turn a non-success response into an error carrying the server's body.
fn check_status(res: Response) -> Result<Response, ServiceError> {
    if !res.status().is_success() {
        let status = res.status();
        let body = res.text().unwrap_or_else(|_| "".into());
        return Err(ServiceError::HttpStatus {
            status: status.as_u16(),
            body,
        });
    }
    Ok(res)
}

fn unreachable_server(err: ServiceError) -> ConfigError {
    ConfigError::ServerUnreachable(err.to_string())
}
