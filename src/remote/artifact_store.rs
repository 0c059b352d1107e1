use async_trait::async_trait;

use super::{RemoteError, RemoteProject};

/// Destination for finished backup artifacts
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str)
        -> Result<(), RemoteError>;
}

/// Artifacts stored in a bucket of the admin's own project
pub struct BucketArtifactStore {
    project: RemoteProject,
    bucket: String,
}

impl BucketArtifactStore {
    pub fn new(project: RemoteProject, bucket: impl Into<String>) -> Self {
        Self {
            project,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl ArtifactStore for BucketArtifactStore {
    async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), RemoteError> {
        tracing::debug!("Uploading {} bytes to {}/{}", bytes.len(), self.bucket, key);
        self.project
            .upload_object(&self.bucket, key, bytes, content_type)
            .await
    }
}
