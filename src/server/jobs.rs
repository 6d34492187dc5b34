//! Background jobs: the store, the job record, and the runner.
//!
//! Extractors know nothing about jobs. The runner opens a job, runs the
//! extractor on the blocking pool with a progress callback that appends to
//! the job log, and records either the summary or the error.

use crate::analyze::analyze_corpus;
use crate::config::ExtractionConfig;
use crate::extract::{extract_legacy_records, extract_remote_to_paged_document, extract_tabular};
use crate::output::ExtractionStatus;
use crate::progress::ExtractionProgress;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    Tabular,
    Legacy,
    Remote,
    Analyze,
}

/// What a job was asked to do. Serialized flat into the job object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum JobParams {
    Tabular {
        file: String,
        output_dir: String,
        num_papers: usize,
        seed: u64,
    },
    Legacy {
        file: String,
        output_dir: String,
    },
    Remote {
        source_id: String,
        output_dir: String,
        limit: usize,
    },
    Analyze {
        source_id: String,
        limit: Option<usize>,
    },
}

impl JobParams {
    pub fn kind(&self) -> JobKind {
        match self {
            JobParams::Tabular { .. } => JobKind::Tabular,
            JobParams::Legacy { .. } => JobKind::Legacy,
            JobParams::Remote { .. } => JobKind::Remote,
            JobParams::Analyze { .. } => JobKind::Analyze,
        }
    }

    fn output_dir(&self) -> Option<&str> {
        match self {
            JobParams::Tabular { output_dir, .. }
            | JobParams::Legacy { output_dir, .. }
            | JobParams::Remote { output_dir, .. } => Some(output_dir),
            JobParams::Analyze { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
    #[serde(rename = "type")]
    pub kind: JobKind,
    #[serde(flatten)]
    pub params: JobParams,
    pub log: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_count: Option<usize>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(params: JobParams) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            status: JobStatus::Running,
            kind: params.kind(),
            params,
            log: Vec::new(),
            error: None,
            result: None,
            file_count: None,
            created_at: now,
            updated_at: now,
        }
    }
}

// ── Store ────────────────────────────────────────────────────────────────

/// Shared job registry.
pub trait JobStore: Send + Sync {
    fn create(&self, job: Job);

    /// Apply `f` to the job; `false` when the id is unknown.
    fn update(&self, id: &str, f: Box<dyn FnOnce(&mut Job) + Send + '_>) -> bool;

    fn get(&self, id: &str) -> Option<Job>;

    /// Every job, oldest first.
    fn list(&self) -> Vec<Job>;
}

/// Finished jobs kept by [`InMemoryJobStore::new`].
pub const DEFAULT_RETAINED_JOBS: usize = 1000;

/// Process-local store; jobs vanish on restart.
///
/// Running jobs are always kept. Once more than `max_finished` jobs have
/// finished, the ones that finished earliest are dropped on the next
/// `create`.
pub struct InMemoryJobStore {
    jobs: DashMap<String, Job>,
    max_finished: usize,
}

impl Default for InMemoryJobStore {
    fn default() -> Self {
        Self::with_retention(DEFAULT_RETAINED_JOBS)
    }
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retention(max_finished: usize) -> Self {
        Self {
            jobs: DashMap::new(),
            max_finished,
        }
    }

    fn evict_finished(&self) {
        let mut finished: Vec<(DateTime<Utc>, String)> = self
            .jobs
            .iter()
            .filter(|e| e.value().status != JobStatus::Running)
            .map(|e| (e.value().updated_at, e.key().clone()))
            .collect();
        if finished.len() <= self.max_finished {
            return;
        }
        finished.sort();
        let excess = finished.len() - self.max_finished;
        for (_, id) in finished.into_iter().take(excess) {
            debug!(job_id = %id, "Evicting finished job");
            self.jobs.remove(&id);
        }
    }
}

impl JobStore for InMemoryJobStore {
    fn create(&self, job: Job) {
        self.evict_finished();
        self.jobs.insert(job.id.clone(), job);
    }

    fn update(&self, id: &str, f: Box<dyn FnOnce(&mut Job) + Send + '_>) -> bool {
        match self.jobs.get_mut(id) {
            Some(mut entry) => {
                let job = entry.value_mut();
                f(job);
                job.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    fn get(&self, id: &str) -> Option<Job> {
        self.jobs.get(id).map(|e| e.value().clone())
    }

    fn list(&self) -> Vec<Job> {
        let mut jobs: Vec<Job> = self.jobs.iter().map(|e| e.value().clone()).collect();
        jobs.sort_by_key(|j| j.created_at);
        jobs
    }
}

// ── Job log ──────────────────────────────────────────────────────────────

/// Forwards extractor progress into a job's log.
struct JobLog {
    store: Arc<dyn JobStore>,
    job_id: String,
}

impl JobLog {
    fn append(&self, entry: String) {
        self.store
            .update(&self.job_id, Box::new(move |job: &mut Job| job.log.push(entry)));
    }
}

impl ExtractionProgress for JobLog {
    fn on_batch_start(&self, total_records: Option<usize>) {
        match total_records {
            Some(n) => self.append(format!("Processing {n} records")),
            None => self.append("Processing records".into()),
        }
    }

    fn on_message(&self, message: &str) {
        self.append(message.to_string());
    }

    fn on_record_error(&self, ordinal: usize, error: &str) {
        self.append(format!("Record {ordinal} failed: {error}"));
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize) {
        self.append(format!("Finished: {succeeded} succeeded, {failed} failed"));
    }
}

// ── Runner ───────────────────────────────────────────────────────────────

/// An uploaded file staged on disk; removed when dropped.
pub struct StagedUpload {
    pub path: PathBuf,
    _dir: TempDir,
}

impl StagedUpload {
    /// Write `bytes` under a fresh temp directory as `file_name`.
    pub fn stage(file_name: &str, bytes: &[u8]) -> std::io::Result<Self> {
        let dir = TempDir::new()?;
        let path = dir.path().join(file_name);
        std::fs::write(&path, bytes)?;
        Ok(Self { path, _dir: dir })
    }
}

/// Register a job and run it in the background. Returns the job id.
///
/// Must be called from within a tokio runtime.
pub fn spawn_job(
    store: Arc<dyn JobStore>,
    config: &ExtractionConfig,
    params: JobParams,
    upload: Option<StagedUpload>,
) -> String {
    let job = Job::new(params.clone());
    let job_id = job.id.clone();
    store.create(job);
    info!(job_id = %job_id, kind = ?params.kind(), "Job started");

    let log = Arc::new(JobLog {
        store: Arc::clone(&store),
        job_id: job_id.clone(),
    });
    let config = config.with_progress(log);
    let id = job_id.clone();

    tokio::spawn(async move {
        let upload_path = upload.as_ref().map(|u| u.path.clone());
        let run_params = params.clone();
        let outcome =
            tokio::task::spawn_blocking(move || run_job(&run_params, upload_path.as_deref(), &config))
                .await;
        // The staged upload outlives the run.
        drop(upload);

        let outcome = outcome.unwrap_or_else(|e| Err(format!("job aborted: {e}")));
        finish_job(store.as_ref(), &id, &params, outcome);
    });

    job_id
}

#[instrument(skip_all, fields(kind = ?params.kind()))]
fn run_job(
    params: &JobParams,
    upload: Option<&Path>,
    config: &ExtractionConfig,
) -> Result<serde_json::Value, String> {
    let upload_str = || -> Result<String, String> {
        upload
            .map(|p| p.to_string_lossy().into_owned())
            .ok_or_else(|| "no uploaded file".to_string())
    };
    let to_json = |v: Result<serde_json::Value, serde_json::Error>| v.map_err(|e| e.to_string());

    match params {
        JobParams::Tabular {
            output_dir,
            num_papers,
            seed,
            ..
        } => {
            let summary = extract_tabular(&upload_str()?, output_dir, *num_papers, *seed, config)
                .map_err(|e| e.to_string())?;
            to_json(serde_json::to_value(summary))
        }
        JobParams::Legacy { output_dir, .. } => {
            let summary = extract_legacy_records(upload_str()?, output_dir, config)
                .map_err(|e| e.to_string())?;
            to_json(serde_json::to_value(summary))
        }
        JobParams::Remote {
            source_id,
            output_dir,
            limit,
        } => {
            let summary = extract_remote_to_paged_document(output_dir, source_id, *limit, config)
                .map_err(|e| e.to_string())?;
            if summary.status == ExtractionStatus::Failed {
                return Err(format!(
                    "All {} documents failed. First error: {}",
                    summary.docs_attempted,
                    summary.errors.first().map(String::as_str).unwrap_or("unknown error")
                ));
            }
            to_json(serde_json::to_value(summary))
        }
        JobParams::Analyze { source_id, limit } => {
            let stats = analyze_corpus(source_id, *limit, config).map_err(|e| e.to_string())?;
            to_json(serde_json::to_value(stats))
        }
    }
}

fn finish_job(store: &dyn JobStore, id: &str, params: &JobParams, outcome: Result<serde_json::Value, String>) {
    match outcome {
        Ok(result) => {
            let file_count = params.output_dir().and_then(count_entries);
            info!(job_id = %id, ?file_count, "Job completed");
            store.update(
                id,
                Box::new(move |job: &mut Job| {
                    job.status = JobStatus::Completed;
                    job.result = Some(result);
                    job.file_count = file_count;
                    job.log.push("Completed".into());
                }),
            );
        }
        Err(message) => {
            error!(job_id = %id, error = %message, "Job failed");
            store.update(
                id,
                Box::new(move |job: &mut Job| {
                    job.status = JobStatus::Failed;
                    job.log.push(format!("Failed: {message}"));
                    job.error = Some(message);
                }),
            );
        }
    }
}

fn count_entries(dir: &str) -> Option<usize> {
    std::fs::read_dir(dir).ok().map(|entries| entries.count())
}
