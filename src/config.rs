//! Command line settings and the explicit configuration handed to the
//! client and the import pipeline.

use crate::error::ConfigError;
use crate::scan::DEFAULT_FILTER;
use clap::Parser;
use reqwest::Url;
use std::path::PathBuf;

/// Relative location of the REST endpoint under a Spira install.
const SERVICE_PATH: &str = "Services/v5_0/RestService.svc/";

#[derive(Parser, Debug, Clone)]
#[command(
    name = "spira-attach",
    version,
    about = "Bulk-upload files as attachments into a Spira project",
    after_help = "Example:\n  spira-attach -s http://localhost/Spira -u administrator -t 2 -r C:\\TempUpload"
)]
pub struct Settings {
    /// The URL address of the Spira install.
    #[arg(short = 's', long = "server")]
    pub server: String,

    /// The Spira user login id.
    #[arg(short = 'u', long = "user")]
    pub user: String,

    /// The user's password or API key. Prompted for when not given.
    #[arg(short = 'p', long = "pass", env = "SPIRA_API_KEY", hide_env_values = true)]
    pub password: Option<String>,

    /// The project # to import the attachments into.
    #[arg(short = 't', long = "project")]
    pub project: i64,

    /// File mask to filter imports on.
    #[arg(short = 'f', long = "filter", default_value = DEFAULT_FILTER)]
    pub filter: String,

    /// Include all subdirectories of the given path.
    #[arg(short = 'r', long = "recursive")]
    pub recursive: bool,

    /// Debug output.
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// CSV file mapping file names to artifacts (Filename,ArtifactTypeId,<CustomProperty>).
    #[arg(short = 'm', long = "mapping")]
    pub mapping_file: Option<PathBuf>,

    /// Also write every file's outcome to this JSON file.
    #[arg(long = "report")]
    pub report_file: Option<PathBuf>,

    /// The path to pull files from.
    pub import_path: PathBuf,
}

/// Where and as whom to connect.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub base_url: Url,
    pub login: String,
    pub api_key: String,
    pub project_id: i64,
}

/// What to import.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub import_path: PathBuf,
    pub filter: String,
    pub recursive: bool,
    pub mapping_file: Option<PathBuf>,
}

impl Settings {
    pub fn server_config(&self, api_key: String) -> Result<ServerConfig, ConfigError> {
        Ok(ServerConfig {
            base_url: service_url(&self.server)?,
            login: self.user.clone(),
            api_key,
            project_id: self.project,
        })
    }

    pub fn import_options(&self) -> ImportOptions {
        ImportOptions {
            import_path: self.import_path.clone(),
            filter: self.filter.clone(),
            recursive: self.recursive,
            mapping_file: self.mapping_file.clone(),
        }
    }
}

/// REST service root for a Spira install URL.
pub fn service_url(server: &str) -> Result<Url, ConfigError> {
    let server = server.trim();
    let mut root = server.to_string();
    if !root.ends_with('/') {
        root.push('/');
    }
    let url = Url::parse(&root)
        .and_then(|u| u.join(SERVICE_PATH))
        .map_err(|_| ConfigError::InvalidServerUrl(server.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ConfigError::InvalidServerUrl(server.to_string())),
    }
}
