use async_graphql::Enum;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};

/// A single multiple-choice question as stored in the catalog.
///
/// Field names are camelCase on the wire so that files written by the
/// question import tool can be loaded without translation.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Question {
    pub id: String,
    pub subject: String,
    pub topic: String,
    pub exam_type: ExamType,
    pub difficulty: Difficulty,
    pub question: String,
    pub options: Vec<String>,
    pub answer_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize, Enum, Copy, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExamType {
    #[default]
    Utme,
    Waec,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Enum, Copy, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl ExamType {
    /// Upper bound on subjects a candidate may combine in one sitting.
    pub fn max_subjects(&self) -> Option<usize> {
        match self {
            ExamType::Utme => Some(4),
            ExamType::Waec => None,
        }
    }
}

impl std::fmt::Display for ExamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExamType::Utme => write!(f, "UTME"),
            ExamType::Waec => write!(f, "WAEC"),
        }
    }
}

impl Question {
    pub fn is_correct(&self, option_index: usize) -> bool {
        option_index == self.answer_index
    }

    /// Checks the shape invariants every catalog entry must satisfy.
    pub fn validate_shape(&self) -> AppResult<()> {
        if self.id.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Question id must not be empty".to_string(),
            ));
        }
        if self.subject.trim().is_empty() {
            return Err(AppError::ValidationError(format!(
                "Question '{}' has no subject",
                self.id
            )));
        }
        if self.question.trim().is_empty() {
            return Err(AppError::ValidationError(format!(
                "Question '{}' has no text",
                self.id
            )));
        }
        if self.options.is_empty() {
            return Err(AppError::ValidationError(format!(
                "Question '{}' has no options",
                self.id
            )));
        }
        if self.answer_index >= self.options.len() {
            return Err(AppError::ValidationError(format!(
                "Question '{}' has answerIndex {} but only {} options",
                self.id,
                self.answer_index,
                self.options.len()
            )));
        }
        Ok(())
    }
}
