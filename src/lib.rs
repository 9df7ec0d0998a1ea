// Library root
// -----------
// Bulk import of local files as attachments into a Spira project, optionally
// linking each file to an incident through a mapping file. The binary
// (`main.rs`) wires these modules together.
//
// Module responsibilities:
// - `mapping`: parses the mapping CSV into a case-insensitive lookup table.
// - `scan`: lazily enumerates candidate files under the import path.
// - `resolver`: finds the incident a mapping row refers to.
// - `upload`: the per-file pipeline and the sequential batch loop.
// - `report`: collects outcomes and summarizes them.
// - `remote`: the narrow trait the pipeline talks to the server through.
// - `api`: blocking HTTP implementation of `remote` plus session setup.
// - `config`, `logging`, `ui`: command line, tracing and console output.
pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod mapping;
pub mod model;
pub mod remote;
pub mod report;
pub mod resolver;
pub mod scan;
pub mod ui;
pub mod upload;

pub use error::{ConfigError, FileError, ServiceError};
pub use mapping::{MappingEntry, MappingTable};
pub use model::{ArtifactLink, ArtifactType, AttachmentRecord, FileStage, UploadOutcome, UploadStatus};
pub use remote::RemoteService;
pub use report::{ResultReporter, Summary};
pub use upload::Uploader;
