//! Route handlers. Each extraction endpoint validates its input, registers a
//! job, and returns immediately; clients poll `/api/jobs/:job_id`.

use super::error::ApiError;
use super::jobs::{spawn_job, JobParams, StagedUpload};
use super::AppState;
use axum::extract::{Multipart, Path as UrlPath, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::{Form, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::{Component, Path};
use tracing::{debug, warn};

pub const DEFAULT_TABULAR_DIR: &str = "extracted_papers";
pub const DEFAULT_LEGACY_DIR: &str = "cisi_papers";
pub const DEFAULT_REMOTE_DIR: &str = "remote_documents";
pub const DEFAULT_NUM_PAPERS: usize = 1000;
pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_REMOTE_LIMIT: usize = 100;

#[derive(Debug, Serialize)]
pub struct JobAccepted {
    pub job_id: String,
    pub status: &'static str,
    pub message: String,
}

fn accepted(job_id: String, message: String) -> Json<JobAccepted> {
    Json(JobAccepted {
        job_id,
        status: "running",
        message,
    })
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn list_jobs(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "jobs": state.store.list() }))
}

pub async fn get_job(
    State(state): State<AppState>,
    UrlPath(job_id): UrlPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .store
        .get(&job_id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Job not found".into()))
}

// ── Uploads ──────────────────────────────────────────────────────────────

struct UploadForm {
    file_name: String,
    upload: StagedUpload,
    fields: HashMap<String, String>,
}

impl UploadForm {
    fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    fn number<T: std::str::FromStr>(&self, name: &str, default: T) -> Result<T, ApiError> {
        match self.text(name) {
            None => Ok(default),
            Some(raw) => raw
                .parse()
                .map_err(|_| ApiError::BadRequest(format!("'{name}' must be a non-negative integer"))),
        }
    }
}

/// Read a multipart body: stage the `file` part, collect the text parts.
async fn read_upload(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut fields = HashMap::new();
    let mut file: Option<(String, StagedUpload)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "file" {
            let raw_name = field.file_name().unwrap_or("").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read file data: {e}")))?;
            let file_name = safe_file_name(&raw_name)
                .ok_or_else(|| ApiError::BadRequest("No file selected".into()))?;
            debug!("Staging upload '{}' ({} bytes)", file_name, bytes.len());
            let staged = StagedUpload::stage(&file_name, &bytes)?;
            file = Some((file_name, staged));
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read field '{name}': {e}")))?;
            fields.insert(name, value);
        }
    }

    let (file_name, upload) = file.ok_or_else(|| ApiError::BadRequest("No file uploaded".into()))?;
    Ok(UploadForm {
        file_name,
        upload,
        fields,
    })
}

/// Final path component of a client-supplied name, if it has one.
fn safe_file_name(raw: &str) -> Option<String> {
    Path::new(raw)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.trim().is_empty())
}

pub async fn extract_tabular(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = read_upload(multipart).await?;
    let params = JobParams::Tabular {
        file: form.file_name.clone(),
        output_dir: form.text("output_dir").unwrap_or(DEFAULT_TABULAR_DIR).to_string(),
        num_papers: form.number("num_papers", DEFAULT_NUM_PAPERS)?,
        seed: form.number("seed", DEFAULT_SEED)?,
    };
    let message = format!("Processing {} in the background", form.file_name);
    let job_id = spawn_job(state.store.clone(), &state.config, params, Some(form.upload));
    Ok(accepted(job_id, message))
}

pub async fn extract_legacy(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = read_upload(multipart).await?;
    let params = JobParams::Legacy {
        file: form.file_name.clone(),
        output_dir: form.text("output_dir").unwrap_or(DEFAULT_LEGACY_DIR).to_string(),
    };
    let message = format!("Processing {} in the background", form.file_name);
    let job_id = spawn_job(state.store.clone(), &state.config, params, Some(form.upload));
    Ok(accepted(job_id, message))
}

// ── Remote ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RemoteForm {
    pub output_dir: Option<String>,
    pub source_id: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeForm {
    pub source_id: Option<String>,
    pub limit: Option<usize>,
}

fn required_source(source_id: Option<String>) -> Result<String, ApiError> {
    source_id
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("'source_id' is required".into()))
}

pub async fn extract_remote(
    State(state): State<AppState>,
    Form(form): Form<RemoteForm>,
) -> Result<impl IntoResponse, ApiError> {
    let source_id = required_source(form.source_id)?;
    let requested = form.limit.unwrap_or(DEFAULT_REMOTE_LIMIT);
    let limit = state.config.clamp_remote_limit(requested);
    if limit < requested {
        warn!("Requested limit {} capped at {}", requested, limit);
    }
    let params = JobParams::Remote {
        source_id: source_id.clone(),
        output_dir: form
            .output_dir
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REMOTE_DIR.to_string()),
        limit,
    };
    let job_id = spawn_job(state.store.clone(), &state.config, params, None);
    Ok(accepted(job_id, format!("Extracting up to {limit} documents from {source_id}")))
}

pub async fn analyze_remote(
    State(state): State<AppState>,
    Form(form): Form<AnalyzeForm>,
) -> Result<impl IntoResponse, ApiError> {
    let source_id = required_source(form.source_id)?;
    let params = JobParams::Analyze {
        source_id: source_id.clone(),
        limit: form.limit,
    };
    let job_id = spawn_job(state.store.clone(), &state.config, params, None);
    Ok(accepted(job_id, format!("Analyzing {source_id}")))
}

// ── Files ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct FilesQuery {
    pub output_dir: Option<String>,
}

fn existing_dir(query: &FilesQuery) -> Result<&str, ApiError> {
    let dir = query.output_dir.as_deref().unwrap_or("");
    if dir.is_empty() || !Path::new(dir).is_dir() {
        return Err(ApiError::NotFound(format!("Directory '{dir}' not found")));
    }
    Ok(dir)
}

pub async fn list_files(Query(query): Query<FilesQuery>) -> Result<impl IntoResponse, ApiError> {
    let dir = existing_dir(&query)?;
    let mut files = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        files.push(entry.file_name().to_string_lossy().into_owned());
    }
    files.sort();
    Ok(Json(json!({
        "output_dir": dir,
        "file_count": files.len(),
        "files": files,
    })))
}

pub async fn download_file(
    UrlPath(filename): UrlPath<String>,
    Query(query): Query<FilesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let dir = existing_dir(&query)?;
    let not_found = || ApiError::NotFound(format!("File '{filename}' not found in '{dir}'"));

    let mut components = Path::new(&filename).components();
    let single = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !single {
        return Err(not_found());
    }

    let path = Path::new(dir).join(&filename);
    if !path.is_file() {
        return Err(not_found());
    }
    let bytes = tokio::fs::read(&path).await?;
    let mime = mime_guess::from_path(&path).first_or_octet_stream();
    Ok(([(header::CONTENT_TYPE, mime.to_string())], bytes))
}
