use crate::domain::{Cell, Payload};
use crate::similarity::similarity_ratio;
use crate::utils::{join_numerals, normalize_response};

/// Reads one cell out of a decoded payload. `None` means the value could not
/// be extracted and the table builder writes the missing marker instead.
pub type Extractor = Box<dyn Fn(&Payload<'_>) -> Option<Cell> + Send + Sync>;

pub struct ColumnSpec {
    pub name: String,
    pub extract: Extractor,
}

/// Ordered list of output columns and the extractor behind each one
#[derive(Default)]
pub struct ColumnMapping {
    columns: Vec<ColumnSpec>,
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_column<F>(mut self, name: impl Into<String>, extract: F) -> Self
    where
        F: Fn(&Payload<'_>) -> Option<Cell> + Send + Sync + 'static,
    {
        self.columns.push(ColumnSpec {
            name: name.into(),
            extract: Box::new(extract),
        });
        self
    }

    /// Columns of the digit-span study: `uid`, then three columns per
    /// memory-test trial, then one column per questionnaire item.
    pub fn study(memory_trials: usize, questions: &[String]) -> Self {
        let mut mapping = Self::new().with_column("uid", uid);

        for idx in 0..memory_trials {
            mapping = mapping
                .with_column(format!("memQ_{idx}"), move |p: &Payload<'_>| {
                    memory_test_pair(p, idx).map(|(expected, _)| Cell::Text(expected))
                })
                .with_column(format!("memA_{idx}"), move |p: &Payload<'_>| {
                    memory_test_pair(p, idx).map(|(_, answer)| Cell::Text(answer))
                })
                .with_column(format!("similarity_score_{idx}"), move |p: &Payload<'_>| {
                    similarity_score(p, idx).map(Cell::Float)
                });
        }

        for question in questions {
            let question_id = question.clone();
            mapping = mapping.with_column(question.clone(), move |p: &Payload<'_>| {
                question_answer(p, &question_id)
            });
        }

        mapping
    }

    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnSpec> {
        self.columns.iter()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

pub fn uid(payload: &Payload<'_>) -> Option<Cell> {
    payload.field("uid").map(Cell::from_json)
}

pub fn question_answer(payload: &Payload<'_>, question_id: &str) -> Option<Cell> {
    payload.answer(question_id).map(Cell::from_json)
}

/// Expected digit string and normalized response for memory-test trial `idx`
pub fn memory_test_pair(payload: &Payload<'_>, idx: usize) -> Option<(String, String)> {
    let trial = payload.trial(idx)?;
    let expected = join_numerals(trial.random_numbers()?)?;
    let answer = normalize_response(trial.user_response()?);
    Some((expected, answer))
}

pub fn similarity_score(payload: &Payload<'_>, idx: usize) -> Option<f64> {
    let (expected, answer) = memory_test_pair(payload, idx)?;
    Some(similarity_ratio(&expected, &answer))
}
