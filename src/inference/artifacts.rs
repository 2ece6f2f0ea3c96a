//! Retrieval of trained model and encoder blobs by relative path.

use std::path::PathBuf;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use super::InferenceError;

/// Relative locations of the three artifacts inside a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub model: String,
    pub one_hot_encoder: String,
    pub ordinal_encoder: String,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            model: "model/model.json".to_string(),
            one_hot_encoder: "encoders/one_hot_encoder.json".to_string(),
            ordinal_encoder: "encoders/ordinal_encoder.json".to_string(),
        }
    }
}

/// Where artifacts are read from.
#[derive(Debug, Clone)]
pub enum ArtifactSource {
    /// A local directory; paths are joined onto it.
    Directory(PathBuf),
    /// An HTTP(S) base URL; paths are appended to it.
    Remote { client: Client, base_url: String },
}

impl ArtifactSource {
    pub fn directory(root: impl Into<PathBuf>) -> Self {
        Self::Directory(root.into())
    }

    pub fn remote(base_url: &str) -> Result<Self, InferenceError> {
        let client = Client::builder()
            .user_agent("adr-causality/0.1")
            .gzip(true)
            .build()
            .map_err(|err| InferenceError::ArtifactUnavailable {
                path: base_url.to_string(),
                reason: err.to_string(),
            })?;
        Ok(Self::Remote {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the raw bytes stored under `path`.
    pub async fn fetch(&self, path: &str) -> Result<Vec<u8>, InferenceError> {
        let unavailable = |reason: String| InferenceError::ArtifactUnavailable {
            path: path.to_string(),
            reason,
        };
        match self {
            Self::Directory(root) => {
                let full = root.join(path);
                let bytes = tokio::fs::read(&full)
                    .await
                    .map_err(|err| unavailable(format!("{}: {err}", full.display())))?;
                info!(path = %full.display(), size = bytes.len(), "read artifact");
                Ok(bytes)
            }
            Self::Remote { client, base_url } => {
                let url = format!("{base_url}/{}", path.trim_start_matches('/'));
                let resp = client
                    .get(&url)
                    .send()
                    .await
                    .map_err(|err| unavailable(err.to_string()))?;
                if !resp.status().is_success() {
                    warn!(%url, status = %resp.status(), "artifact download failed");
                    return Err(unavailable(format!("HTTP {}", resp.status())));
                }
                let bytes = resp
                    .bytes()
                    .await
                    .map_err(|err| unavailable(err.to_string()))?;
                info!(%url, size = bytes.len(), "downloaded artifact");
                Ok(bytes.to_vec())
            }
        }
    }

    /// Fetch and decode a JSON artifact.
    pub async fn fetch_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, InferenceError> {
        let bytes = self.fetch(path).await?;
        serde_json::from_slice(&bytes).map_err(|err| InferenceError::ArtifactInvalid {
            artifact: path.to_string(),
            reason: err.to_string(),
        })
    }
}
