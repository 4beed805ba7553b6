use std::{
    fs,
    path::{
        Path,
        PathBuf,
    },
};

use serde::{
    Deserialize,
    Serialize,
};

use crate::core::AbecedaryError;

const APP_NAME: &str = "abecedary";

/// Per-user data directory for progress blobs, config and migration markers.
pub fn default_data_dir() -> PathBuf {
    if let Some(data_dir) = dirs::data_local_dir() {
        let app_dir = data_dir.join(APP_NAME);
        let _ = fs::create_dir_all(&app_dir);
        app_dir
    } else {
        PathBuf::from(".")
    }
}

pub fn save_json<T: Serialize>(
    dir: &Path,
    filename: &str,
    data: &T,
) -> Result<(), AbecedaryError> {
    fs::create_dir_all(dir)?;
    let json = serde_json::to_string_pretty(data)?;
    fs::write(dir.join(filename), json)?;
    Ok(())
}

/// Ok(None) when the file does not exist; MalformedLocalData when it exists
/// but does not parse, so callers can discard exactly that key.
pub fn load_json<T: for<'de> Deserialize<'de>>(
    dir: &Path,
    filename: &str,
) -> Result<Option<T>, AbecedaryError> {
    let file_path = dir.join(filename);
    if !file_path.exists() {
        return Ok(None);
    }

    let json = fs::read_to_string(&file_path)?;
    serde_json::from_str(&json)
        .map(Some)
        .map_err(|_| AbecedaryError::MalformedLocalData { key: filename.to_string() })
}

pub fn delete_data_file(dir: &Path, filename: &str) -> Result<(), AbecedaryError> {
    let file_path = dir.join(filename);
    if file_path.exists() {
        fs::remove_file(&file_path)?;
    }
    Ok(())
}

pub fn data_file_exists(dir: &Path, filename: &str) -> bool {
    dir.join(filename).exists()
}

#[cfg(test)]
mod tests {
    use serde::{
        Deserialize,
        Serialize,
    };

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        count: u32,
    }

    #[test]
    fn round_trips_json() {
        let dir = tempfile::tempdir().unwrap();
        let sample = Sample { name: "abc".to_string(), count: 7 };

        save_json(dir.path(), "sample.json", &sample).unwrap();
        let loaded: Option<Sample> = load_json(dir.path(), "sample.json").unwrap();

        assert_eq!(loaded, Some(sample));
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded: Option<Sample> = load_json(dir.path(), "nope.json").unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn corrupt_file_reports_the_key() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), "{not json").unwrap();

        let result: Result<Option<Sample>, _> = load_json(dir.path(), "bad.json");
        match result {
            Err(AbecedaryError::MalformedLocalData { key }) => assert_eq!(key, "bad.json"),
            other => panic!("Expected MalformedLocalData, got {:?}", other),
        }
    }

    #[test]
    fn delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let sample = Sample { name: "abc".to_string(), count: 1 };

        save_json(dir.path(), "sample.json", &sample).unwrap();
        assert!(data_file_exists(dir.path(), "sample.json"));

        delete_data_file(dir.path(), "sample.json").unwrap();
        delete_data_file(dir.path(), "sample.json").unwrap();
        assert!(!data_file_exists(dir.path(), "sample.json"));
    }
}
