//! Reading and writing dataset files (a UTF-8 JSON array of records).

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::record::Record;

/// Failure to read or write a dataset file.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("cannot access dataset file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("dataset file {path} is not a valid record array: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Write `records` to `path` as a pretty-printed JSON array, creating parent
/// directories as needed.
///
/// The array is written to a sibling temporary file first and renamed into
/// place, so an interrupted write never leaves a truncated dataset behind.
pub fn save_dataset(path: &Path, records: &[Record]) -> Result<(), OutputError> {
    let io_err = |source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let json = serde_json::to_string_pretty(records).map_err(|source| OutputError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)?;

    log::info!("wrote {} records to {}", records.len(), path.display());
    Ok(())
}

/// Read a dataset file written by [`save_dataset`].
pub fn load_dataset(path: &Path) -> Result<Vec<Record>, OutputError> {
    let data = fs::read_to_string(path).map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&data).map_err(|source| OutputError::Json {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Difficulty;
    use tempfile::tempdir;

    fn record() -> Record {
        Record {
            origin: "Deadline là thứ sáu".into(),
            spoken: "đét lai là thứ sáu".into(),
            en_word: vec!["Deadline".into()],
            vi_spoken_word: vec!["đét lai".into()],
            kind: Difficulty::Easy,
            en_phrase: vec!["Deadline".into()],
        }
    }

    #[test]
    fn save_creates_directories_and_reloads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out/nested/dataset.json");

        save_dataset(&path, &[record(), record()]).unwrap();
        let loaded = load_dataset(&path).unwrap();
        assert_eq!(loaded, vec![record(), record()]);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn output_is_unescaped_utf8_with_type_key() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dataset.json");

        save_dataset(&path, &[record()]).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.trim_start().starts_with('['));
        assert!(text.contains("đét lai"));
        assert!(text.contains("\"type\": \"easy\""));
    }

    #[test]
    fn empty_dataset_is_an_empty_array() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.json");
        save_dataset(&path, &[]).unwrap();
        assert!(load_dataset(&path).unwrap().is_empty());
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = load_dataset(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, OutputError::Io { .. }));
    }

    #[test]
    fn malformed_file_is_json_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{\"origin\": 1}").unwrap();
        assert!(matches!(load_dataset(&path), Err(OutputError::Json { .. })));
    }

    #[test]
    fn unwritable_target_is_io_error() {
        let dir = tempdir().unwrap();
        // A directory cannot be replaced by the dataset file.
        let target = dir.path().join("taken");
        fs::create_dir(&target).unwrap();
        fs::create_dir(target.with_extension("json.tmp")).unwrap();
        assert!(matches!(
            save_dataset(&target, &[record()]),
            Err(OutputError::Io { .. })
        ));
    }
}
