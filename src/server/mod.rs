//! HTTP job service.
//!
//! A thin layer over the extractors: every `POST` registers a job, runs the
//! extractor on the blocking pool, and returns the job id at once. All
//! routes live under `/api`:
//!
//! | Method | Path                    | Purpose                                  |
//! |--------|-------------------------|------------------------------------------|
//! | GET    | `/health`               | liveness                                 |
//! | GET    | `/jobs`                 | every job, oldest first                  |
//! | GET    | `/jobs/:job_id`         | one job                                  |
//! | POST   | `/extract/tabular`      | multipart Parquet upload → Markdown      |
//! | POST   | `/extract/legacy`       | multipart legacy corpus upload → Markdown |
//! | POST   | `/extract/remote`       | form: remote corpus → PDFs               |
//! | POST   | `/analyze/remote`       | form: token statistics                   |
//! | GET    | `/files?output_dir=`    | list a batch directory                   |
//! | GET    | `/files/:name?output_dir=` | download one file                     |

pub mod error;
pub mod handlers;
pub mod jobs;
pub mod router;

use crate::config::ExtractionConfig;
use jobs::JobStore;
use std::sync::Arc;

pub use error::ApiError;
pub use jobs::{InMemoryJobStore, Job, JobKind, JobParams, JobStatus};
pub use router::{build_router, serve, ServerOptions};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn JobStore>,
    pub config: ExtractionConfig,
}

impl AppState {
    pub fn new(config: ExtractionConfig) -> Self {
        Self {
            store: Arc::new(InMemoryJobStore::new()),
            config,
        }
    }
}
