use crate::domain::RawRecord;
use tracing::info;

/// Default value of the payload `code` field that marks a test submission
pub const SENTINEL_CODE: &str = "123123123";

/// Record selection applied before the table is built
#[derive(Debug, Clone)]
pub struct RecordFilter {
    pub sentinel_code: String,
    /// Keep only these treatment groups; empty keeps every group
    pub treatment_groups: Vec<i64>,
}

impl Default for RecordFilter {
    fn default() -> Self {
        Self {
            sentinel_code: SENTINEL_CODE.to_string(),
            treatment_groups: Vec::new(),
        }
    }
}

impl RecordFilter {
    pub fn is_sentinel(&self, record: &RawRecord) -> bool {
        record.payload().str_field("code") == Some(self.sentinel_code.as_str())
    }

    pub fn in_selected_group(&self, record: &RawRecord) -> bool {
        if self.treatment_groups.is_empty() {
            return true;
        }
        record
            .payload()
            .field("treatmentGroupId")
            .and_then(|v| v.as_i64())
            .is_some_and(|group| self.treatment_groups.contains(&group))
    }

    /// Drops sentinel submissions, then records outside the selected groups.
    /// Relative order of the kept records is unchanged.
    pub fn apply(&self, records: Vec<RawRecord>) -> Vec<RawRecord> {
        let total = records.len();
        let (kept, sentinels): (Vec<_>, Vec<_>) =
            records.into_iter().partition(|r| !self.is_sentinel(r));
        let kept: Vec<RawRecord> = kept
            .into_iter()
            .filter(|r| self.in_selected_group(r))
            .collect();
        info!(
            total,
            sentinel = sentinels.len(),
            other_groups = total - sentinels.len() - kept.len(),
            kept = kept.len(),
            "filtered records"
        );
        kept
    }
}
