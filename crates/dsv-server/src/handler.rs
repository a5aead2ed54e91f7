use std::sync::Arc;

use axum::extract::{Multipart, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json};
use dsv_store::{DatasetId, FsStore, MergeMode, StoreResult, VersionKind};

use crate::api::{
    DatasetQuery, HealthResponse, MetadataResponse, MetadataStatus, PingResponse,
    StoreMetadataRequest, StoreMetadataResponse, UploadResponse, VersionsQuery,
    VersionsResponse, METADATA_MODE_HEADER, upload_fields,
};
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<FsStore>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(store: Arc<FsStore>, config: ServerConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    /// Run a store call on the blocking pool. Store calls wait on dataset
    /// locks and disk I/O.
    async fn with_store<T, F>(&self, f: F) -> ServerResult<T>
    where
        F: FnOnce(&FsStore) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let result = tokio::task::spawn_blocking(move || f(&store))
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;
        Ok(result?)
    }
}

/// `GET /`
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

/// `GET {prefix}/ping`
pub async fn ping_handler(State(state): State<AppState>) -> Json<PingResponse> {
    Json(PingResponse {
        message: "pong".into(),
        service: state.config.service_name.clone(),
    })
}

/// `POST {prefix}/datasets/storeMetadata`
///
/// Creates the dataset when its directory is absent; otherwise merges into it
/// with the mode named by `X-Metadata-Mode` (default override).
pub async fn store_metadata_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<StoreMetadataRequest>,
) -> ServerResult<Json<StoreMetadataResponse>> {
    let mode = metadata_mode(&headers)?;
    let StoreMetadataRequest {
        dataset_id,
        metadata,
    } = request;

    let status = state
        .with_store(move |store| {
            if store.dataset_dir_exists(dataset_id) {
                store.update_metadata(dataset_id, metadata, mode)?;
                Ok(MetadataStatus::Updated)
            } else {
                store.store_metadata(dataset_id, metadata)?;
                Ok(MetadataStatus::Created)
            }
        })
        .await?;

    tracing::info!(dataset = %dataset_id, ?status, %mode, "metadata stored");
    Ok(Json(StoreMetadataResponse { dataset_id, status }))
}

/// `POST {prefix}/datasets/uploadFile`
///
/// A `multipart/form-data` body with a `dataset_id` text field and a `file`
/// part holding the payload. Other fields are ignored.
pub async fn upload_file_handler(
    State(state): State<AppState>,
    mut form: Multipart,
) -> ServerResult<(StatusCode, Json<UploadResponse>)> {
    let mut dataset_id = None;
    let mut payload = None;
    while let Some(field) = form.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some(upload_fields::DATASET_ID) => {
                let text = field.text().await?;
                let id = text
                    .trim()
                    .parse::<DatasetId>()
                    .map_err(|e| ServerError::BadRequest(e.to_string()))?;
                dataset_id = Some(id);
            }
            Some(upload_fields::FILE) => payload = Some(field.bytes().await?),
            _ => {}
        }
    }
    let dataset_id = dataset_id.ok_or_else(|| missing_field(upload_fields::DATASET_ID))?;
    let payload = payload.ok_or_else(|| missing_field(upload_fields::FILE))?;

    let size = payload.len();
    let path = state
        .with_store(move |store| store.store_data(dataset_id, payload.to_vec()))
        .await?;

    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    tracing::info!(dataset = %dataset_id, bytes = size, %filename, "file uploaded");

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            dataset_id,
            status: "uploaded".into(),
            filename,
        }),
    ))
}

/// `GET {prefix}/datasets/metadata?dataset_id=`
pub async fn get_metadata_handler(
    State(state): State<AppState>,
    Query(query): Query<DatasetQuery>,
) -> ServerResult<Json<MetadataResponse>> {
    let dataset_id = query.dataset_id;
    let metadata = state
        .with_store(move |store| store.fetch_metadata(dataset_id))
        .await?;
    Ok(Json(MetadataResponse {
        dataset_id,
        metadata,
    }))
}

/// `GET {prefix}/datasets/file?dataset_id=`
pub async fn get_file_handler(
    State(state): State<AppState>,
    Query(query): Query<DatasetQuery>,
) -> ServerResult<impl IntoResponse> {
    let dataset_id = query.dataset_id;
    let bytes = state
        .with_store(move |store| store.fetch_data(dataset_id))
        .await?;
    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        bytes,
    ))
}

/// `GET {prefix}/datasets/versions?dataset_id=&kind=`
pub async fn versions_handler(
    State(state): State<AppState>,
    Query(query): Query<VersionsQuery>,
) -> ServerResult<Json<VersionsResponse>> {
    let dataset_id = query.dataset_id;
    let kind = query.kind.unwrap_or(VersionKind::Data);
    let (current, versions) = state
        .with_store(move |store| {
            let versions = store.list_versions(dataset_id, kind)?;
            let current = store.current_version(dataset_id, kind)?;
            Ok((current, versions))
        })
        .await?;

    Ok(Json(VersionsResponse {
        dataset_id,
        kind,
        current: current.map(|v| v.file_name()),
        versions: versions.iter().map(|v| v.file_name()).collect(),
    }))
}

/// `DELETE {prefix}/datasets?dataset_id=`
pub async fn delete_dataset_handler(
    State(state): State<AppState>,
    Query(query): Query<DatasetQuery>,
) -> ServerResult<StatusCode> {
    let dataset_id = query.dataset_id;
    state
        .with_store(move |store| store.delete_dataset(dataset_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

fn missing_field(name: &str) -> ServerError {
    ServerError::BadRequest(format!("missing form field: {name}"))
}

fn metadata_mode(headers: &HeaderMap) -> ServerResult<MergeMode> {
    let Some(value) = headers.get(METADATA_MODE_HEADER) else {
        return Ok(MergeMode::default());
    };
    let value = value
        .to_str()
        .map_err(|_| ServerError::BadRequest("Invalid metadata update mode".into()))?;
    value
        .parse()
        .map_err(|e: dsv_store::MergeError| ServerError::BadRequest(e.to_string()))
}
