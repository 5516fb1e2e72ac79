use crate::codes::batch_offset;
use crate::error::{Error, Result};
use crate::filter::{RecordFilter, SENTINEL_CODE};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Questionnaire items exported as columns, in output order
pub const STUDY_QUESTIONS: [&str; 26] = [
    "Fink_Q_1",
    "Fink_Q_2",
    "Fink_Q_3",
    "Fink_Q_4",
    "Fink_Q_5",
    "Attention_Q_1",
    "Device_Q",
    "Calstera_Q_1",
    "Calstera_Q_2",
    "Calstera_Q_3",
    "Calstera_Q_4",
    "Attention_Q_2",
    "Calstera_Q_5",
    "Calstera_Q_6",
    "Calstera_Q_7",
    "Calstera_Q_8",
    "Calstera_Q_9",
    "Calstera_Q_10",
    "Calstera_Q_11",
    "Calstera_Q_12",
    "Calstera_Q_13",
    "Calstera_Q_14",
    "Calstera_Q_15",
    "Calstera_Q_16",
    "Calstera_Q_17",
    "q_comments",
];

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AnalysisConfig {
    #[serde(default = "AnalysisConfig::default_input_path")]
    pub input_path: PathBuf,
    #[serde(default = "AnalysisConfig::default_cache_path")]
    pub cache_path: PathBuf,
    #[serde(default = "AnalysisConfig::default_output_path")]
    pub output_path: PathBuf,
    /// Read the expanded cache instead of decoding the export again
    #[serde(default)]
    pub from_cache: bool,
    #[serde(default = "AnalysisConfig::default_sentinel_code")]
    pub sentinel_code: String,
    #[serde(default)]
    pub treatment_groups: Vec<i64>,
    #[serde(default = "AnalysisConfig::default_memory_trials")]
    pub memory_trials: usize,
    #[serde(default = "AnalysisConfig::default_questions")]
    pub questions: Vec<String>,
    #[serde(default)]
    pub missing_marker: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            input_path: Self::default_input_path(),
            cache_path: Self::default_cache_path(),
            output_path: Self::default_output_path(),
            from_cache: false,
            sentinel_code: Self::default_sentinel_code(),
            treatment_groups: Vec::new(),
            memory_trials: Self::default_memory_trials(),
            questions: Self::default_questions(),
            missing_marker: String::new(),
        }
    }
}

impl AnalysisConfig {
    fn default_input_path() -> PathBuf {
        PathBuf::from("analysis/select_results_81.json")
    }

    fn default_cache_path() -> PathBuf {
        PathBuf::from("analysis/json_results_81.json")
    }

    fn default_output_path() -> PathBuf {
        PathBuf::from("analysis/42_measures_reslts_76.csv")
    }

    fn default_sentinel_code() -> String {
        SENTINEL_CODE.to_string()
    }

    fn default_memory_trials() -> usize {
        5
    }

    fn default_questions() -> Vec<String> {
        STUDY_QUESTIONS.iter().map(|q| (*q).to_string()).collect()
    }

    /// Loads a JSON config file; fields it leaves out take their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.questions.is_empty() {
            return Err(Error::Config("question list must not be empty".to_string()));
        }
        if self.sentinel_code.is_empty() {
            return Err(Error::Config("sentinel code must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn record_filter(&self) -> RecordFilter {
        RecordFilter {
            sentinel_code: self.sentinel_code.clone(),
            treatment_groups: self.treatment_groups.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CodeConfig {
    #[serde(default = "CodeConfig::default_seed")]
    pub seed: u64,
    #[serde(default = "CodeConfig::default_length")]
    pub length: usize,
    #[serde(default = "CodeConfig::default_count")]
    pub count: usize,
    /// Which slice of `count` codes to issue; earlier slices were issued before
    #[serde(default = "CodeConfig::default_batch")]
    pub batch: usize,
    #[serde(default = "CodeConfig::default_label")]
    pub label: String,
    #[serde(default = "CodeConfig::default_table")]
    pub table: String,
}

impl Default for CodeConfig {
    fn default() -> Self {
        Self {
            seed: Self::default_seed(),
            length: Self::default_length(),
            count: Self::default_count(),
            batch: Self::default_batch(),
            label: Self::default_label(),
            table: Self::default_table(),
        }
    }
}

impl CodeConfig {
    fn default_seed() -> u64 {
        12_233_445
    }

    fn default_length() -> usize {
        10
    }

    fn default_count() -> usize {
        320
    }

    fn default_batch() -> usize {
        1
    }

    fn default_label() -> String {
        "Your Prolific PID".to_string()
    }

    fn default_table() -> String {
        "digit_span_b_codes".to_string()
    }

    /// Loads a JSON config file; fields it leaves out take their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.count == 0 {
            return Err(Error::Config("code count must be at least 1".to_string()));
        }
        if self.length == 0 {
            return Err(Error::Config("code length must be at least 1".to_string()));
        }
        if batch_offset(self.count, self.batch).is_none() {
            return Err(Error::Config(format!(
                "batch {} of {} codes is out of range",
                self.batch, self.count
            )));
        }
        let valid_table = !self.table.is_empty()
            && self
                .table
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid_table {
            return Err(Error::Config(format!("invalid table name: {:?}", self.table)));
        }
        Ok(())
    }
}
