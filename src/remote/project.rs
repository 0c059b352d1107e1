use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;

use super::{Bucket, ProjectConnector, ProjectSession, RemoteError, StorageEntry};
use crate::models::{ProjectCredentials, Row};

/// Longest error body kept in error messages
const MAX_ERROR_BODY: usize = 512;

/// Session against one hosted project's REST and storage APIs
///
/// Holds no auth state of its own: the project key is sent on every request,
/// so there is nothing to persist or refresh between calls.
#[derive(Clone)]
pub struct RemoteProject {
    http: Client,
    base_url: String,
    api_key: String,
    list_limit: u32,
}

impl RemoteProject {
    pub fn new(http: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
            list_limit: crate::constants::DEFAULT_STORAGE_LIST_LIMIT,
        }
    }

    pub fn with_list_limit(mut self, list_limit: u32) -> Self {
        self.list_limit = list_limit;
        self
    }

    /// Upload `bytes` to `bucket` under `key`, replacing any existing object
    pub async fn upload_object(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), RemoteError> {
        let mut segments = vec!["storage", "v1", "object", bucket];
        segments.extend(key.split('/').filter(|s| !s.is_empty()));
        let url = self.endpoint(&segments)?;

        let request = self
            .http
            .post(url.clone())
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "true")
            .body(bytes);
        self.send(url, request).await?;

        Ok(())
    }

    /// Base URL joined with percent-encoded path segments
    fn endpoint(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let invalid = |reason: String| RemoteError::InvalidUrl {
            url: self.base_url.clone(),
            reason,
        };

        let mut url = Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    async fn send(&self, url: Url, request: RequestBuilder) -> Result<Vec<u8>, RemoteError> {
        let response = request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|source| RemoteError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(RemoteError::Status {
                status: status.as_u16(),
                url: url.to_string(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| RemoteError::Transport {
                url: url.to_string(),
                source,
            })?;

        Ok(bytes.to_vec())
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        url: Url,
        request: RequestBuilder,
    ) -> Result<T, RemoteError> {
        let bytes = self.send(url.clone(), request).await?;
        serde_json::from_slice(&bytes).map_err(|source| RemoteError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl ProjectSession for RemoteProject {
    async fn select_all(&self, table: &str) -> Result<Vec<Row>, RemoteError> {
        let mut url = self.endpoint(&["rest", "v1", table])?;
        url.query_pairs_mut().append_pair("select", "*");

        let request = self.http.get(url.clone());
        self.send_json(url, request).await
    }

    async fn list_buckets(&self) -> Result<Vec<Bucket>, RemoteError> {
        let url = self.endpoint(&["storage", "v1", "bucket"])?;

        let request = self.http.get(url.clone());
        self.send_json(url, request).await
    }

    /// Pages through the listing until a page comes back short
    async fn list_root_objects(&self, bucket: &str) -> Result<Vec<StorageEntry>, RemoteError> {
        let url = self.endpoint(&["storage", "v1", "object", "list", bucket])?;
        let limit = self.list_limit.max(1);

        let mut entries = Vec::new();
        let mut offset: u64 = 0;
        loop {
            let request = self.http.post(url.clone()).json(&json!({
                "prefix": "",
                "limit": limit,
                "offset": offset,
                "sortBy": { "column": "name", "order": "asc" },
            }));
            let page: Vec<StorageEntry> = self.send_json(url.clone(), request).await?;

            let last_page = page.len() < limit as usize;
            entries.extend(page);
            if last_page {
                break;
            }
            offset += u64::from(limit);
        }

        Ok(entries)
    }

    async fn download_object(&self, bucket: &str, name: &str) -> Result<Vec<u8>, RemoteError> {
        let url = self.endpoint(&["storage", "v1", "object", bucket, name])?;

        let request = self.http.get(url.clone());
        self.send(url, request).await
    }
}

/// Connector sharing one pooled HTTP client across all customer sessions
#[derive(Clone)]
pub struct HttpConnector {
    http: Client,
    list_limit: u32,
}

impl HttpConnector {
    pub fn new(timeout: Duration, list_limit: u32) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, list_limit })
    }

    pub fn client(&self) -> Client {
        self.http.clone()
    }
}

impl ProjectConnector for HttpConnector {
    fn connect(&self, credentials: &ProjectCredentials) -> Box<dyn ProjectSession> {
        Box::new(
            RemoteProject::new(
                self.http.clone(),
                credentials.project_url.clone(),
                credentials.project_key.clone(),
            )
            .with_list_limit(self.list_limit),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(base: &str) -> RemoteProject {
        RemoteProject::new(Client::new(), base, "key")
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let url = project("https://abc.example.co")
            .endpoint(&["rest", "v1", "faqs"])
            .unwrap();
        assert_eq!(url.as_str(), "https://abc.example.co/rest/v1/faqs");

        let url = project("https://abc.example.co/")
            .endpoint(&["storage", "v1", "bucket"])
            .unwrap();
        assert_eq!(url.as_str(), "https://abc.example.co/storage/v1/bucket");
    }

    #[test]
    fn test_endpoint_encodes_object_names() {
        let url = project("https://abc.example.co")
            .endpoint(&["storage", "v1", "object", "docs", "my file.pdf"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://abc.example.co/storage/v1/object/docs/my%20file.pdf"
        );
    }

    #[test]
    fn test_malformed_url_fails_on_use_not_construction() {
        let session = project("not a url");
        let err = session.endpoint(&["rest", "v1", "faqs"]).unwrap_err();
        assert!(err.is_unreachable());
    }
}
