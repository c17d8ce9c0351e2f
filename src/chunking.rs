//! Chunk partitioning
//!
//! Splits a JSON array of records into fixed-size page documents named
//! `<label>-<index>.json`, the layout the data routes serve.

use serde_json::Value;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Records per chunk when none is given
pub const DEFAULT_CHUNK_SIZE: usize = 100;

#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} does not contain a JSON array")]
    NotAnArray(PathBuf),

    #[error("chunk size must be at least 1")]
    ZeroSize,
}

/// Storage name of chunk `index` for `label`
pub fn chunk_key(label: &str, index: usize) -> String {
    format!("{label}-{index}.json")
}

/// Split records into consecutive pages of at most `size` records
///
/// An empty input yields a single empty page.
pub fn partition(records: Vec<Value>, size: NonZeroUsize) -> Vec<Vec<Value>> {
    if records.is_empty() {
        return vec![Vec::new()];
    }

    let mut pages = Vec::with_capacity(records.len().div_ceil(size.get()));
    let mut records = records.into_iter().peekable();
    while records.peek().is_some() {
        pages.push(records.by_ref().take(size.get()).collect());
    }
    pages
}

/// Read `input`, partition it and write every page below `out_dir`
///
/// Returns the number of chunk documents written.
pub fn write_chunks(
    input: &Path,
    out_dir: &Path,
    label: &str,
    size: usize,
) -> Result<usize, ChunkError> {
    let size = NonZeroUsize::new(size).ok_or(ChunkError::ZeroSize)?;

    let raw = fs::read(input).map_err(|source| ChunkError::Io {
        path: input.to_path_buf(),
        source,
    })?;
    let document: Value = serde_json::from_slice(&raw).map_err(|source| ChunkError::Json {
        path: input.to_path_buf(),
        source,
    })?;
    let Value::Array(records) = document else {
        return Err(ChunkError::NotAnArray(input.to_path_buf()));
    };

    fs::create_dir_all(out_dir).map_err(|source| ChunkError::Io {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let pages = partition(records, size);
    for (index, page) in pages.iter().enumerate() {
        let path = out_dir.join(chunk_key(label, index));
        let body = serde_json::to_vec(page).map_err(|source| ChunkError::Json {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, body).map_err(|source| ChunkError::Io { path, source })?;
    }

    Ok(pages.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn size(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn records(n: usize) -> Vec<Value> {
        (0..n).map(|i| json!({ "id": i })).collect()
    }

    #[test]
    fn test_chunk_key() {
        assert_eq!(chunk_key("data", 0), "data-0.json");
        assert_eq!(chunk_key("photos", 12), "photos-12.json");
    }

    #[test]
    fn test_partition_sizes() {
        let pages = partition(records(250), size(100));
        let lens: Vec<usize> = pages.iter().map(Vec::len).collect();
        assert_eq!(lens, vec![100, 100, 50]);
        assert_eq!(pages[2][0], json!({ "id": 200 }));
    }

    #[test]
    fn test_partition_exact_multiple() {
        assert_eq!(partition(records(200), size(100)).len(), 2);
    }

    #[test]
    fn test_partition_empty_keeps_first_page() {
        assert_eq!(partition(Vec::new(), size(100)), vec![Vec::<Value>::new()]);
    }

    #[test]
    fn test_write_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("records.json");
        fs::write(&input, serde_json::to_vec(&records(5)).unwrap()).unwrap();
        let out = dir.path().join("bucket/data");

        let written = write_chunks(&input, &out, "data", 2).unwrap();
        assert_eq!(written, 3);

        let last: Value = serde_json::from_slice(&fs::read(out.join("data-2.json")).unwrap())
            .unwrap();
        assert_eq!(last, json!([{ "id": 4 }]));
        assert!(!out.join("data-3.json").exists());
    }

    #[test]
    fn test_write_chunks_rejects_bad_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("object.json");
        fs::write(&input, r#"{"id": 1}"#).unwrap();

        assert!(matches!(
            write_chunks(&input, dir.path(), "data", 10),
            Err(ChunkError::NotAnArray(_))
        ));
        assert!(matches!(
            write_chunks(&input, dir.path(), "data", 0),
            Err(ChunkError::ZeroSize)
        ));
        assert!(matches!(
            write_chunks(&dir.path().join("missing.json"), dir.path(), "data", 10),
            Err(ChunkError::Io { .. })
        ));
    }
}
