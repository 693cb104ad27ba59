//! On-disk passage index (one JSON object per line).

use std::fs;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::Passage;

/// Failure reading or writing the passage index.
#[derive(Error, Debug)]
pub enum IndexError {
    /// File could not be opened, read or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A line is not a valid passage.
    #[error("invalid passage at {path}:{line}: {source}")]
    Parse {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// A passage could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// In-memory set of passages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassageIndex {
    passages: Vec<Passage>,
}

impl PassageIndex {
    #[must_use]
    pub fn new(passages: Vec<Passage>) -> Self {
        Self { passages }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.passages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    #[must_use]
    pub fn passages(&self) -> &[Passage] {
        &self.passages
    }

    #[must_use]
    pub fn into_passages(self) -> Vec<Passage> {
        self.passages
    }

    /// Read an index file. Blank lines are skipped.
    pub fn load(path: &Path) -> Result<Self, IndexError> {
        let io_err = |source| IndexError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = fs::File::open(path).map_err(io_err)?;
        let mut passages = Vec::new();
        for (n, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(io_err)?;
            if line.trim().is_empty() {
                continue;
            }
            let passage = serde_json::from_str(&line).map_err(|source| IndexError::Parse {
                path: path.to_path_buf(),
                line: n + 1,
                source,
            })?;
            passages.push(passage);
        }
        Ok(Self { passages })
    }

    /// Write the index, replacing any existing file.
    pub fn save(&self, path: &Path) -> Result<(), IndexError> {
        let io_err = |source| IndexError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let mut out = BufWriter::new(fs::File::create(path).map_err(io_err)?);
        for passage in &self.passages {
            serde_json::to_writer(&mut out, passage)?;
            out.write_all(b"\n").map_err(io_err)?;
        }
        out.flush().map_err(io_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(id: &str, text: &str) -> Passage {
        Passage {
            id: id.to_string(),
            text: text.to_string(),
            source: "doc.txt".to_string(),
            embedding: None,
        }
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("passages.jsonl");

        let mut with_vector = passage("doc.txt#1", "second");
        with_vector.embedding = Some(vec![0.5, -0.25]);
        let index = PassageIndex::new(vec![passage("doc.txt#0", "first"), with_vector]);
        index.save(&path).unwrap();

        let loaded = PassageIndex::load(&path).unwrap();
        assert_eq!(loaded, index);
    }

    #[test]
    fn test_embedding_omitted_when_absent() {
        let line = serde_json::to_string(&passage("a#0", "text")).unwrap();
        assert!(!line.contains("embedding"));
    }

    #[test]
    fn test_bad_line_reports_position() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("passages.jsonl");
        fs::write(
            &path,
            "{\"id\":\"a#0\",\"text\":\"ok\",\"source\":\"a\"}\n\nnot json\n",
        )
        .unwrap();

        let err = PassageIndex::load(&path).unwrap_err();
        assert!(matches!(err, IndexError::Parse { line: 3, .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = PassageIndex::load(Path::new("/nonexistent/passages.jsonl")).unwrap_err();
        assert!(matches!(err, IndexError::Io { .. }));
    }
}
