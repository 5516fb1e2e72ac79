use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key under which the study client stores questionnaire answers.
/// The misspelling is what the client actually writes.
pub const ANSWERS_KEY: &str = "quessionsAnswers";
pub const CONTEXT_KEY: &str = "conversationContext";

static NULL: Value = Value::Null;

/// One row of the database export: an envelope around the encoded submission.
/// The envelope is kept as an ordered map so a rewritten cache mirrors the
/// input field for field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
    fields: Map<String, Value>,
}

impl RawRecord {
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Base64 text in `result.data`
    pub fn encoded_data(&self) -> Option<&str> {
        self.fields.get("result")?.get("data")?.as_str()
    }

    /// Decoded value in `result.json`, if the record has been decoded
    pub fn decoded(&self) -> Option<&Value> {
        self.fields.get("result")?.get("json")
    }

    /// Stores `value` as `result.json` and clears `result.data`.
    /// Returns `false` if the record has no `result` object.
    pub fn set_decoded(&mut self, value: Value) -> bool {
        let Some(result) = self.fields.get_mut("result").and_then(Value::as_object_mut) else {
            return false;
        };
        result.insert("data".to_string(), Value::String(String::new()));
        result.insert("json".to_string(), value);
        true
    }

    /// Decoded payload of this record. Records that were never decoded read as
    /// an empty payload, so every lookup on them comes back absent.
    pub fn payload(&self) -> Payload<'_> {
        Payload::new(self.decoded().unwrap_or(&NULL))
    }

    pub fn is_decoded(&self) -> bool {
        self.decoded().is_some()
    }
}

/// Read-only view over a decoded submission. Every accessor returns `None`
/// when the field is absent or has the wrong shape.
#[derive(Debug, Clone, Copy)]
pub struct Payload<'a> {
    value: &'a Value,
}

impl<'a> Payload<'a> {
    pub fn new(value: &'a Value) -> Self {
        Self { value }
    }

    pub fn field(&self, key: &str) -> Option<&'a Value> {
        self.value.get(key)
    }

    pub fn str_field(&self, key: &str) -> Option<&'a str> {
        self.field(key)?.as_str()
    }

    /// Answer given to `question_id` in the questionnaire section
    pub fn answer(&self, question_id: &str) -> Option<&'a Value> {
        self.field(ANSWERS_KEY)?.get(question_id)
    }

    /// Memory-test trial at position `idx` of the conversation context
    pub fn trial(&self, idx: usize) -> Option<Trial<'a>> {
        let value = self.field(CONTEXT_KEY)?.as_array()?.get(idx)?;
        Some(Trial { value })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Trial<'a> {
    value: &'a Value,
}

impl<'a> Trial<'a> {
    pub fn random_numbers(&self) -> Option<&'a [Value]> {
        self.value.get("random_numbers")?.as_array().map(Vec::as_slice)
    }

    pub fn user_response(&self) -> Option<&'a str> {
        self.value.get("user_response")?.as_str()
    }
}

/// A single output cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Integer(i64),
    Float(f64),
    Missing,
}

impl Cell {
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Cell::Missing,
            Value::Bool(true) => Cell::Text("True".to_string()),
            Value::Bool(false) => Cell::Text("False".to_string()),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Cell::Integer(i),
                None => n.as_f64().map_or(Cell::Missing, Cell::Float),
            },
            Value::String(s) => Cell::Text(s.clone()),
            other => Cell::Text(other.to_string()),
        }
    }

    pub fn is_missing(&self) -> bool {
        match self {
            Cell::Missing => true,
            Cell::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// Text form used by delimited sinks. Floats use the shortest round-trip
    /// representation, so `1.0` stays `1.0`.
    pub fn render(&self, missing_marker: &str) -> String {
        if self.is_missing() {
            return missing_marker.to_string();
        }
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Integer(i) => i.to_string(),
            Cell::Float(f) => format!("{f:?}"),
            Cell::Missing => missing_marker.to_string(),
        }
    }
}

/// Rectangular output: one row per record, columns fixed by the column mapping
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_answer_lookup() {
        let value = json!({"quessionsAnswers": {"Fink_Q_1": "3"}});
        let payload = Payload::new(&value);
        assert_eq!(payload.answer("Fink_Q_1"), Some(&json!("3")));
        assert_eq!(payload.answer("Fink_Q_2"), None);
    }

    #[test]
    fn test_payload_trial_out_of_range() {
        let value = json!({"conversationContext": [{"random_numbers": [1], "user_response": "one"}]});
        let payload = Payload::new(&value);
        assert!(payload.trial(0).is_some());
        assert!(payload.trial(1).is_none());
    }

    #[test]
    fn test_payload_trial_wrong_shape() {
        let value = json!({"conversationContext": {"0": {}}});
        assert!(Payload::new(&value).trial(0).is_none());
    }

    #[test]
    fn test_undecoded_record_reads_as_empty() {
        let record: RawRecord = serde_json::from_value(json!({"result": {"data": "e30="}})).unwrap();
        assert!(!record.is_decoded());
        assert!(record.payload().field("uid").is_none());
    }

    #[test]
    fn test_set_decoded_keeps_key_order() {
        let mut record: RawRecord = serde_json::from_str(
            r#"{"id": 1, "result": {"data": "e30=", "status": "ok"}, "completed": true}"#,
        )
        .unwrap();
        assert!(record.set_decoded(json!({"uid": 1})));
        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            r#"{"id":1,"result":{"data":"","status":"ok","json":{"uid":1}},"completed":true}"#
        );
    }

    #[test]
    fn test_set_decoded_without_result() {
        let mut record: RawRecord = serde_json::from_value(json!({"id": 1})).unwrap();
        assert!(!record.set_decoded(json!({})));
        assert!(record.encoded_data().is_none());
    }

    #[test]
    fn test_cell_from_json() {
        assert_eq!(Cell::from_json(&json!(null)), Cell::Missing);
        assert_eq!(Cell::from_json(&json!(7)), Cell::Integer(7));
        assert_eq!(Cell::from_json(&json!(2.5)), Cell::Float(2.5));
        assert_eq!(Cell::from_json(&json!("x")), Cell::Text("x".to_string()));
        assert_eq!(Cell::from_json(&json!(true)), Cell::Text("True".to_string()));
    }

    #[test]
    fn test_cell_render() {
        assert_eq!(Cell::Float(1.0).render(""), "1.0");
        assert_eq!(Cell::Float(0.75).render(""), "0.75");
        assert_eq!(Cell::Float(f64::NAN).render("NA"), "NA");
        assert_eq!(Cell::Missing.render("NA"), "NA");
        assert_eq!(Cell::Integer(42).render(""), "42");
    }

    #[test]
    fn test_table_cell_by_name() {
        let table = Table {
            columns: vec!["uid".to_string(), "memQ_0".to_string()],
            rows: vec![vec![Cell::Integer(1), Cell::Text("427".to_string())]],
        };
        assert_eq!(table.cell(0, "memQ_0"), Some(&Cell::Text("427".to_string())));
        assert_eq!(table.cell(0, "nope"), None);
        assert_eq!(table.cell(1, "uid"), None);
    }
}
