use crate::domain::RawRecord;
use crate::error::{Error, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::Value;
use tracing::debug;

/// Decodes base64 text into the JSON value it carries.
/// Line breaks inside the base64 text are ignored, as database exports wrap
/// long encoded values.
pub fn decode_payload(encoded: &str) -> std::result::Result<Value, String> {
    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = BASE64
        .decode(compact.as_bytes())
        .map_err(|e| format!("invalid base64: {e}"))?;
    let text = String::from_utf8(bytes).map_err(|e| format!("invalid UTF-8: {e}"))?;
    serde_json::from_str(&text).map_err(|e| format!("invalid JSON: {e}"))
}

/// Replaces `result.data` with the decoded `result.json`
pub fn decode_record(record: &mut RawRecord, index: usize) -> Result<()> {
    let encoded = record.encoded_data().ok_or_else(|| Error::Decode {
        index,
        reason: "missing result.data".to_string(),
    })?;
    let value = decode_payload(encoded).map_err(|reason| Error::Decode { index, reason })?;
    if !record.set_decoded(value) {
        return Err(Error::Decode {
            index,
            reason: "result is not an object".to_string(),
        });
    }
    debug!(index, "decoded record");
    Ok(())
}

/// Decodes every record, stopping at the first failure
pub fn decode_all(records: &mut [RawRecord]) -> Result<()> {
    for (index, record) in records.iter_mut().enumerate() {
        decode_record(record, index)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn encoded(value: &Value) -> String {
        BASE64.encode(value.to_string())
    }

    fn record_with_data(data: &str) -> RawRecord {
        serde_json::from_value(json!({"id": 3, "result": {"data": data}})).unwrap()
    }

    #[test]
    fn test_decode_record_replaces_data() {
        let payload = json!({"uid": 9, "code": "abc"});
        let mut record = record_with_data(&encoded(&payload));
        decode_record(&mut record, 0).unwrap();
        assert_eq!(record.encoded_data(), Some(""));
        assert_eq!(record.decoded(), Some(&payload));
        assert_eq!(record.field("id"), Some(&json!(3)));
    }

    #[test]
    fn test_decode_payload_ignores_line_breaks() {
        let payload = json!({"q_comments": "a fairly long comment so the base64 needs wrapping"});
        let text = encoded(&payload);
        let (head, tail) = text.split_at(20);
        let wrapped = format!("{head}\n{tail}\n");
        assert_eq!(decode_payload(&wrapped).unwrap(), payload);
    }

    #[test]
    fn test_decode_payload_rejects_bad_base64() {
        let err = decode_payload("not base64 at all!").unwrap_err();
        assert!(err.starts_with("invalid base64"));
    }

    #[test]
    fn test_decode_payload_rejects_bad_json() {
        let err = decode_payload(&BASE64.encode("{not json")).unwrap_err();
        assert!(err.starts_with("invalid JSON"));
    }

    #[test]
    fn test_decode_record_without_data() {
        let mut record: RawRecord = serde_json::from_value(json!({"result": {}})).unwrap();
        assert!(matches!(
            decode_record(&mut record, 4),
            Err(Error::Decode { index: 4, .. })
        ));
    }

    #[test]
    fn test_decode_all_reports_failing_index() {
        let mut records = vec![
            record_with_data(&encoded(&json!({}))),
            record_with_data("%%%"),
        ];
        match decode_all(&mut records) {
            Err(Error::Decode { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected decode error, got {other:?}"),
        }
    }
}
