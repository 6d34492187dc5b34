//! Input resolution: normalise a user-supplied path or URL to a local file.
//!
//! Remote inputs are downloaded into a `TempDir` that lives as long as the
//! returned [`ResolvedInput`]; dropping it removes the download. Everything
//! here is blocking: extractors run on a blocking thread.

use crate::error::ExtractError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info};

/// A local path, or a downloaded temp file kept alive with its directory.
#[derive(Debug)]
pub enum ResolvedInput {
    /// Input was already a local file.
    Local(PathBuf),
    /// Input was a URL; the body was saved into a temp directory.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve `input` to a readable local file, downloading it if it is a URL.
pub fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, ExtractError> {
    if is_url(input) {
        download_url(input, timeout_secs)
    } else {
        resolve_local(Path::new(input)).map(ResolvedInput::Local)
    }
}

/// Check that a local file exists and is readable.
pub fn resolve_local(path: &Path) -> Result<PathBuf, ExtractError> {
    let path = path.to_path_buf();
    if !path.is_file() {
        return Err(ExtractError::SourceNotFound { path });
    }
    match std::fs::File::open(&path) {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ExtractError::PermissionDenied { path });
        }
        Err(source) => return Err(ExtractError::SourceRead { path, source }),
    }
    debug!("Resolved local source: {}", path.display());
    Ok(path)
}

fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, ExtractError> {
    info!("Downloading source from: {}", url);

    let failed = |reason: String| ExtractError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().map_err(|e| {
        if e.is_timeout() {
            ExtractError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let filename = filename_from_url(url);
    let temp_dir = TempDir::new().map_err(|e| ExtractError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(&filename);

    let bytes = response.bytes().map_err(|e| {
        if e.is_timeout() {
            ExtractError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    })?;

    std::fs::write(&file_path, &bytes)
        .map_err(|e| ExtractError::Internal(format!("Failed to write temp file: {e}")))?;

    info!("Downloaded {} bytes to: {}", bytes.len(), file_path.display());

    Ok(ResolvedInput::Downloaded {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

/// Last path segment of the URL if it looks like a file name.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') && !last.contains("..") {
                    return last.to_string();
                }
            }
        }
    }
    "download.bin".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/dump.jsonl"));
        assert!(is_url("http://example.com/data.parquet"));
        assert!(!is_url("/tmp/data.parquet"));
        assert!(!is_url("wikipedia:en"));
        assert!(!is_url(""));
    }

    #[test]
    fn filename_from_url_uses_last_segment() {
        assert_eq!(
            filename_from_url("https://host/a/b/train.parquet?x=1"),
            "train.parquet"
        );
        assert_eq!(filename_from_url("https://host/"), "download.bin");
        assert_eq!(filename_from_url("https://host/dir/noext"), "download.bin");
    }

    #[test]
    fn missing_local_file() {
        let err = resolve_input("/definitely/not/here.parquet", 5).unwrap_err();
        assert!(matches!(err, ExtractError::SourceNotFound { .. }));
    }

    #[test]
    fn directory_is_not_a_source() {
        let tmp = tempfile::tempdir().unwrap();
        let err = resolve_local(tmp.path()).unwrap_err();
        assert!(matches!(err, ExtractError::SourceNotFound { .. }));
    }

    #[test]
    fn existing_local_file_resolves() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("x.txt");
        std::fs::write(&path, "hi").unwrap();
        let resolved = resolve_input(path.to_str().unwrap(), 5).unwrap();
        assert_eq!(resolved.path(), path.as_path());
    }
}
