//! Access to hosted backend projects
//!
//! Customer projects are reached through [`ProjectSession`], built per run by a
//! [`ProjectConnector`]. Finished artifacts go to the admin project through an
//! [`ArtifactStore`]. Both sides speak the same REST dialect, implemented by
//! [`RemoteProject`].

pub mod artifact_store;
pub mod project;

pub use artifact_store::{ArtifactStore, BucketArtifactStore};
pub use project::{HttpConnector, RemoteProject};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::models::{ProjectCredentials, Row};

/// Errors talking to a remote project
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Invalid project URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} from {url}: {body}")]
    Status { status: u16, url: String, body: String },

    #[error("Unexpected response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl RemoteError {
    /// The project could not be reached or rejected the key outright
    pub fn is_unreachable(&self) -> bool {
        match self {
            RemoteError::InvalidUrl { .. } | RemoteError::Transport { .. } => true,
            RemoteError::Status { status, .. } => *status == 401,
            RemoteError::Decode { .. } => false,
        }
    }
}

/// Storage bucket as listed by the project
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Bucket {
    pub name: String,
}

/// Root-level entry of a bucket listing; folders have no id
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageEntry {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
}

impl StorageEntry {
    pub fn is_folder(&self) -> bool {
        self.id.is_none()
    }
}

/// One-shot session scoped to a single remote project
#[async_trait]
pub trait ProjectSession: Send + Sync {
    /// Every column of every row in `table`
    async fn select_all(&self, table: &str) -> Result<Vec<Row>, RemoteError>;

    async fn list_buckets(&self) -> Result<Vec<Bucket>, RemoteError>;

    /// Entries directly under the bucket root
    async fn list_root_objects(&self, bucket: &str) -> Result<Vec<StorageEntry>, RemoteError>;

    async fn download_object(&self, bucket: &str, name: &str) -> Result<Vec<u8>, RemoteError>;
}

/// Builds project sessions from stored credentials
///
/// Construction performs no I/O and never fails; bad credentials surface on
/// the first request.
pub trait ProjectConnector: Send + Sync {
    fn connect(&self, credentials: &ProjectCredentials) -> Box<dyn ProjectSession>;
}
