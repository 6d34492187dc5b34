//! Batch output sink: one flat directory per batch, one file per record.
//!
//! The writer owns the set of identifiers already used in the current batch.
//! A second record that sanitizes to the same identifier gets a numeric
//! suffix (`_2`, `_3`, …) instead of overwriting the first. Files left
//! behind by an earlier run are not tracked and are simply replaced.

use crate::error::{ExtractError, RecordError};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct BatchWriter {
    dir: PathBuf,
    extension: &'static str,
    used: HashSet<String>,
}

impl BatchWriter {
    /// Create (if needed) `dir` and prepare to write `*.{extension}` files.
    pub fn create(dir: impl AsRef<Path>, extension: &'static str) -> Result<Self, ExtractError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|source| ExtractError::OutputDirFailed {
            path: dir.clone(),
            source,
        })?;
        Ok(Self {
            dir,
            extension,
            used: HashSet::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path the given identifier maps to, whether or not it exists yet.
    pub fn path_for(&self, identifier: &str) -> PathBuf {
        self.dir.join(format!("{identifier}.{}", self.extension))
    }

    /// Whether an output for `identifier` is already on disk.
    pub fn exists(&self, identifier: &str) -> bool {
        self.path_for(identifier).is_file()
    }

    /// Claim `base` for this batch, suffixing it if it was already claimed.
    pub fn reserve(&mut self, base: &str) -> String {
        if self.used.insert(base.to_string()) {
            return base.to_string();
        }
        let mut n = 2usize;
        loop {
            let candidate = format!("{base}_{n}");
            if self.used.insert(candidate.clone()) {
                debug!("Identifier '{}' already used; writing as '{}'", base, candidate);
                return candidate;
            }
            n += 1;
        }
    }

    /// Write `contents` to `{identifier}.{ext}` atomically.
    pub fn write(&self, identifier: &str, contents: &[u8]) -> Result<PathBuf, RecordError> {
        let path = self.path_for(identifier);
        write_atomic(&path, contents).map_err(|e| RecordError::WriteFailed {
            identifier: identifier.to_string(),
            detail: e.to_string(),
        })?;
        Ok(path)
    }
}

/// Write to a sibling temp file and rename it over `path`.
///
/// Readers of the directory never observe a half-written file.
pub fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, contents)?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_nested_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("a/b/c");
        let w = BatchWriter::create(&dir, "md").unwrap();
        assert!(dir.is_dir());
        assert_eq!(w.dir(), dir.as_path());
    }

    #[test]
    fn reserve_suffixes_duplicates() {
        let tmp = tempfile::tempdir().unwrap();
        let mut w = BatchWriter::create(tmp.path(), "md").unwrap();
        assert_eq!(w.reserve("paper"), "paper");
        assert_eq!(w.reserve("paper"), "paper_2");
        assert_eq!(w.reserve("paper"), "paper_3");
        assert_eq!(w.reserve("other"), "other");
    }

    #[test]
    fn reserve_skips_taken_suffix() {
        let tmp = tempfile::tempdir().unwrap();
        let mut w = BatchWriter::create(tmp.path(), "md").unwrap();
        assert_eq!(w.reserve("a_2"), "a_2");
        assert_eq!(w.reserve("a"), "a");
        assert_eq!(w.reserve("a"), "a_3");
    }

    #[test]
    fn write_leaves_no_temp_file() {
        let tmp = tempfile::tempdir().unwrap();
        let w = BatchWriter::create(tmp.path(), "md").unwrap();
        let path = w.write("doc", b"hello").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello");
        assert!(w.exists("doc"));
        let names: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["doc.md"]);
    }

    #[test]
    fn write_overwrites_previous_run() {
        let tmp = tempfile::tempdir().unwrap();
        let w = BatchWriter::create(tmp.path(), "md").unwrap();
        w.write("doc", b"old").unwrap();
        w.write("doc", b"new").unwrap();
        assert_eq!(std::fs::read_to_string(w.path_for("doc")).unwrap(), "new");
    }

    #[test]
    fn create_fails_when_path_is_a_file() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("occupied");
        std::fs::write(&file, "x").unwrap();
        let err = BatchWriter::create(&file, "md").err().unwrap();
        assert!(matches!(err, ExtractError::OutputDirFailed { .. }));
    }
}
