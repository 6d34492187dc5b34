//! Configuration types for record extraction.
//!
//! Every limit the extractors enforce lives in [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. One struct keeps the knobs shareable
//! across worker threads and easy to log when two runs disagree.

use crate::error::ExtractError;
use crate::progress::ProgressCallback;
use std::fmt;

/// Configuration shared by all extractors.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use corpus2md::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .remote_max_documents(50)
///     .request_delay_ms(0)
///     .build()
///     .unwrap();
/// assert_eq!(config.remote_max_documents, 50);
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Maximum characters of a sanitized title inside an identifier. Default: 100.
    pub max_identifier_len: usize,

    /// Exclusive upper bound of code points kept in paged output. Default: 128.
    ///
    /// The paged renderer uses a builtin PDF font that only covers the 7-bit
    /// range; anything above is replaced with a space.
    pub max_code_point: u32,

    /// Hard ceiling on documents pulled by the remote extractor. Default: 500.
    ///
    /// Caller-requested limits are clamped to this value.
    pub remote_max_documents: usize,

    /// Title characters kept before sanitizing paged output. Default: 80.
    pub title_max_chars: usize,

    /// Body characters kept before sanitizing paged output. Default: 50 000.
    pub body_max_chars: usize,

    /// Characters per body chunk handed to the paged renderer. Default: 1000.
    pub chunk_chars: usize,

    /// Error messages returned in a summary. Default: 20.
    ///
    /// Counts are always complete; only the message list is truncated.
    pub error_list_cap: usize,

    /// File names returned in a remote summary. Default: 100.
    pub file_list_cap: usize,

    /// Pause between per-document requests to a remote catalog. Default: 1000 ms.
    pub request_delay_ms: u64,

    /// Per-request timeout for remote catalogs, in seconds. Default: 30.
    pub request_timeout_secs: u64,

    /// Timeout for downloading a bulk source from a URL, in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Drop string metadata values longer than this. Default: None (keep all).
    pub max_metadata_text_len: Option<usize>,

    /// Minimum length of the first non-empty sample for a fallback content
    /// column. Default: 100.
    pub content_min_chars: usize,

    /// Optional progress callback. Default: None.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_identifier_len: 100,
            max_code_point: 128,
            remote_max_documents: 500,
            title_max_chars: 80,
            body_max_chars: 50_000,
            chunk_chars: 1000,
            error_list_cap: 20,
            file_list_cap: 100,
            request_delay_ms: 1000,
            request_timeout_secs: 30,
            download_timeout_secs: 120,
            max_metadata_text_len: None,
            content_min_chars: 100,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("max_identifier_len", &self.max_identifier_len)
            .field("max_code_point", &self.max_code_point)
            .field("remote_max_documents", &self.remote_max_documents)
            .field("title_max_chars", &self.title_max_chars)
            .field("body_max_chars", &self.body_max_chars)
            .field("chunk_chars", &self.chunk_chars)
            .field("error_list_cap", &self.error_list_cap)
            .field("file_list_cap", &self.file_list_cap)
            .field("request_delay_ms", &self.request_delay_ms)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("max_metadata_text_len", &self.max_metadata_text_len)
            .field("content_min_chars", &self.content_min_chars)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ExtractionProgress>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Clamp a caller-requested remote limit to the hard ceiling.
    pub fn clamp_remote_limit(&self, requested: usize) -> usize {
        requested.min(self.remote_max_documents)
    }

    /// Return a copy of this config that reports to `callback`.
    pub fn with_progress(&self, callback: ProgressCallback) -> Self {
        let mut config = self.clone();
        config.progress_callback = Some(callback);
        config
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn max_identifier_len(mut self, n: usize) -> Self {
        self.config.max_identifier_len = n;
        self
    }

    pub fn max_code_point(mut self, cp: u32) -> Self {
        self.config.max_code_point = cp;
        self
    }

    pub fn remote_max_documents(mut self, n: usize) -> Self {
        self.config.remote_max_documents = n;
        self
    }

    pub fn title_max_chars(mut self, n: usize) -> Self {
        self.config.title_max_chars = n;
        self
    }

    pub fn body_max_chars(mut self, n: usize) -> Self {
        self.config.body_max_chars = n;
        self
    }

    pub fn chunk_chars(mut self, n: usize) -> Self {
        self.config.chunk_chars = n;
        self
    }

    pub fn error_list_cap(mut self, n: usize) -> Self {
        self.config.error_list_cap = n;
        self
    }

    pub fn file_list_cap(mut self, n: usize) -> Self {
        self.config.file_list_cap = n;
        self
    }

    pub fn request_delay_ms(mut self, ms: u64) -> Self {
        self.config.request_delay_ms = ms;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn max_metadata_text_len(mut self, n: Option<usize>) -> Self {
        self.config.max_metadata_text_len = n;
        self
    }

    pub fn content_min_chars(mut self, n: usize) -> Self {
        self.config.content_min_chars = n;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = &self.config;
        if c.max_identifier_len == 0 {
            return Err(ExtractError::InvalidConfig(
                "max_identifier_len must be ≥ 1".into(),
            ));
        }
        if c.chunk_chars == 0 {
            return Err(ExtractError::InvalidConfig("chunk_chars must be ≥ 1".into()));
        }
        if !(33..=0x11_0000).contains(&c.max_code_point) {
            return Err(ExtractError::InvalidConfig(format!(
                "max_code_point must be 33–1114112, got {}",
                c.max_code_point
            )));
        }
        if c.request_timeout_secs == 0 {
            return Err(ExtractError::InvalidConfig(
                "request_timeout_secs must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_limits() {
        let c = ExtractionConfig::default();
        assert_eq!(c.max_identifier_len, 100);
        assert_eq!(c.max_code_point, 128);
        assert_eq!(c.remote_max_documents, 500);
        assert_eq!(c.chunk_chars, 1000);
        assert_eq!(c.error_list_cap, 20);
        assert_eq!(c.file_list_cap, 100);
        assert!(c.max_metadata_text_len.is_none());
    }

    #[test]
    fn clamp_never_exceeds_ceiling() {
        let c = ExtractionConfig::default();
        assert_eq!(c.clamp_remote_limit(10), 10);
        assert_eq!(c.clamp_remote_limit(5000), 500);
    }

    #[test]
    fn builder_rejects_zero_chunk() {
        let err = ExtractionConfig::builder().chunk_chars(0).build().unwrap_err();
        assert!(err.to_string().contains("chunk_chars"));
    }

    #[test]
    fn builder_rejects_tiny_code_point_range() {
        assert!(ExtractionConfig::builder().max_code_point(10).build().is_err());
    }

    #[test]
    fn debug_hides_callback() {
        let c = ExtractionConfig::builder()
            .progress_callback(std::sync::Arc::new(crate::progress::NoopProgress))
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(dbg.contains("<dyn ExtractionProgress>"));
    }
}
