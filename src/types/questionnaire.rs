use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::question::QuestionId;

#[derive(Serialize, Debug, Clone, Copy, Eq, Hash, Deserialize, PartialEq)]
pub struct QuestionnaireId(pub i32);

/// An ordered list of questions. The order of `question_ids` is the
/// order in which the questions are asked.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Questionnaire {
    pub id: QuestionnaireId,
    pub title: String,
    pub description: Option<String>,
    pub question_ids: Vec<QuestionId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct NewQuestionnaire {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub question_ids: Vec<QuestionId>,
}
