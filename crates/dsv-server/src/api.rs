//! Route paths and the JSON bodies exchanged on them.

use dsv_store::{DatasetId, Metadata, VersionKind};
use serde::{Deserialize, Serialize};

/// Route paths, relative to the configured API prefix unless noted.
pub mod endpoints {
    /// Health check; always mounted at the root.
    pub const HEALTH: &str = "/";
    pub const PING: &str = "/ping";
    pub const DATASETS: &str = "/datasets";
    pub const STORE_METADATA: &str = "/datasets/storeMetadata";
    pub const UPLOAD_FILE: &str = "/datasets/uploadFile";
    pub const METADATA: &str = "/datasets/metadata";
    pub const FILE: &str = "/datasets/file";
    pub const VERSIONS: &str = "/datasets/versions";
}

/// Selects how `storeMetadata` merges into an existing dataset.
pub const METADATA_MODE_HEADER: &str = "x-metadata-mode";

/// Form fields of an `uploadFile` request.
pub mod upload_fields {
    pub const DATASET_ID: &str = "dataset_id";
    pub const FILE: &str = "file";
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".into(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PingResponse {
    pub message: String,
    pub service: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreMetadataRequest {
    pub dataset_id: DatasetId,
    pub metadata: serde_json::Value,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataStatus {
    Created,
    Updated,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreMetadataResponse {
    pub dataset_id: DatasetId,
    pub status: MetadataStatus,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub dataset_id: DatasetId,
    pub status: String,
    /// File name of the new data version.
    pub filename: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MetadataResponse {
    pub dataset_id: DatasetId,
    pub metadata: Metadata,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VersionsResponse {
    pub dataset_id: DatasetId,
    pub kind: VersionKind,
    pub current: Option<String>,
    /// Version file names, oldest first.
    pub versions: Vec<String>,
}

/// `?dataset_id=<uuid>`
#[derive(Clone, Debug, Deserialize)]
pub struct DatasetQuery {
    pub dataset_id: DatasetId,
}

/// `?dataset_id=<uuid>&kind=data|metadata`
#[derive(Clone, Debug, Deserialize)]
pub struct VersionsQuery {
    pub dataset_id: DatasetId,
    #[serde(default)]
    pub kind: Option<VersionKind>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn metadata_status_is_lowercase() {
        let body = StoreMetadataResponse {
            dataset_id: "67e55044-10b1-426f-9247-bb680e5fe0c8".parse().unwrap(),
            status: MetadataStatus::Created,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"dataset_id": "67e55044-10b1-426f-9247-bb680e5fe0c8", "status": "created"})
        );
    }

    #[test]
    fn health_defaults_to_ok() {
        assert_eq!(HealthResponse::default().status, "ok");
    }
}
