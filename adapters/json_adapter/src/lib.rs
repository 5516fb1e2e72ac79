use serde_json::ser::PrettyFormatter;
use serde_json::Serializer;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use study_core::decode::decode_all;
use study_core::domain::RawRecord;
use study_core::ports::{Error, RecordSource, Result};
use tracing::info;

/// Where the records come from
#[derive(Debug, Clone)]
pub enum SourceMode {
    /// Raw database export; every `result.data` is decoded and the expanded
    /// records are written to `cache_path`
    Export { cache_path: Option<PathBuf> },
    /// A cache written by a previous export run
    Cache,
}

/// JSON-file implementation of the RecordSource trait
pub struct JsonRecordSource {
    input_path: PathBuf,
    mode: SourceMode,
}

impl JsonRecordSource {
    pub fn from_export(input_path: PathBuf, cache_path: Option<PathBuf>) -> Self {
        Self {
            input_path,
            mode: SourceMode::Export { cache_path },
        }
    }

    pub fn from_cache(cache_path: PathBuf) -> Self {
        Self {
            input_path: cache_path,
            mode: SourceMode::Cache,
        }
    }

    fn read_records(&self) -> Result<Vec<RawRecord>> {
        let file = File::open(&self.input_path)?;
        let records: Vec<RawRecord> = serde_json::from_reader(BufReader::new(file))?;
        Ok(records)
    }
}

/// Writes records as JSON indented by four spaces
pub fn write_cache(path: &Path, records: &[RawRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut out = BufWriter::new(File::create(path)?);
    let mut serializer = Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    serde::Serialize::serialize(records, &mut serializer)?;
    out.flush()?;
    Ok(())
}

impl RecordSource for JsonRecordSource {
    fn fetch_all_records(&self) -> Result<Vec<RawRecord>> {
        let mut records = self.read_records()?;
        info!(path = %self.input_path.display(), records = records.len(), "read records");

        match &self.mode {
            SourceMode::Export { cache_path } => {
                decode_all(&mut records)?;
                if let Some(cache_path) = cache_path {
                    write_cache(cache_path, &records)?;
                    info!(path = %cache_path.display(), "wrote decoded cache");
                }
            }
            SourceMode::Cache => {
                if let Some(index) = records.iter().position(|r| !r.is_decoded()) {
                    return Err(Error::Decode {
                        index,
                        reason: "cache record has no result.json".to_string(),
                    });
                }
            }
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    fn write_export(dir: &TempDir, payloads: &[Value]) -> PathBuf {
        let records: Vec<Value> = payloads
            .iter()
            .enumerate()
            .map(|(i, p)| {
                json!({
                    "id": i,
                    "completed": true,
                    "result": {"data": BASE64.encode(p.to_string())}
                })
            })
            .collect();
        let path = dir.path().join("select_results.json");
        fs::write(&path, serde_json::to_string(&records).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_export_decodes_and_writes_cache() {
        let dir = TempDir::new().unwrap();
        let payloads = vec![json!({"uid": 1, "code": "a"}), json!({"uid": 2, "code": "b"})];
        let input = write_export(&dir, &payloads);
        let cache = dir.path().join("cache").join("json_results.json");

        let source = JsonRecordSource::from_export(input, Some(cache.clone()));
        let records = source.fetch_all_records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].decoded(), Some(&payloads[1]));
        assert_eq!(records[1].encoded_data(), Some(""));

        let cached: Value = serde_json::from_str(&fs::read_to_string(&cache).unwrap()).unwrap();
        assert_eq!(cached[0]["result"]["data"], json!(""));
        assert_eq!(cached[0]["result"]["json"], payloads[0]);
        assert_eq!(cached[0]["completed"], json!(true));
        assert!(fs::read_to_string(&cache).unwrap().contains("\n    {"));
    }

    #[test]
    fn test_cache_round_trip_matches_export() {
        let dir = TempDir::new().unwrap();
        let input = write_export(&dir, &[json!({"uid": 7})]);
        let cache = dir.path().join("json_results.json");
        let exported = JsonRecordSource::from_export(input, Some(cache.clone()))
            .fetch_all_records()
            .unwrap();

        let reloaded = JsonRecordSource::from_cache(cache).fetch_all_records().unwrap();
        assert_eq!(reloaded.len(), exported.len());
        assert_eq!(reloaded[0].decoded(), exported[0].decoded());
    }

    #[test]
    fn test_cache_keeps_envelope_key_order() {
        let dir = TempDir::new().unwrap();
        let input = write_export(&dir, &[json!({"uid": 7, "code": "x", "conversationContext": []})]);
        let cache = dir.path().join("json_results.json");
        JsonRecordSource::from_export(input, Some(cache.clone()))
            .fetch_all_records()
            .unwrap();

        let text = fs::read_to_string(&cache).unwrap();
        let positions: Vec<usize> = ["\"id\"", "\"completed\"", "\"result\"", "\"data\"", "\"json\"", "\"uid\"", "\"code\""]
            .iter()
            .map(|key| text.find(key).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{text}");
    }

    #[test]
    fn test_cache_without_json_is_rejected() {
        let dir = TempDir::new().unwrap();
        let input = write_export(&dir, &[json!({"uid": 7})]);
        match JsonRecordSource::from_cache(input).fetch_all_records() {
            Err(Error::Decode { index, .. }) => assert_eq!(index, 0),
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_base64_aborts_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("select_results.json");
        fs::write(&path, r#"[{"result": {"data": "@@@"}}]"#).unwrap();
        let cache = dir.path().join("json_results.json");
        let result = JsonRecordSource::from_export(path, Some(cache.clone())).fetch_all_records();
        assert!(matches!(result, Err(Error::Decode { index: 0, .. })));
        assert!(!cache.exists());
    }

    #[test]
    fn test_missing_input_file() {
        let dir = TempDir::new().unwrap();
        let source = JsonRecordSource::from_export(dir.path().join("nope.json"), None);
        assert!(matches!(source.fetch_all_records(), Err(Error::Io(_))));
    }
}
