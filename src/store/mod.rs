use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use tokio::sync::RwLock;

use handle_errors::Error;

use crate::types::{
    question::{NewQuestion, Question, QuestionId, QuestionKind, QuestionType},
    questionnaire::{NewQuestionnaire, Questionnaire},
};

mod memory;
mod postgres;

use memory::MemoryTables;

/// Handle to wherever questions live. Cheap to clone; every clone talks
/// to the same pool or the same in-memory tables.
#[derive(Debug, Clone)]
pub struct Store {
    backend: Backend,
}

#[derive(Debug, Clone)]
enum Backend {
    Postgres(PgPool),
    Memory(Arc<RwLock<MemoryTables>>),
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self, Error> {
        let pool = postgres::connect(db_url).await?;
        Ok(Store {
            backend: Backend::Postgres(pool),
        })
    }

    pub fn in_memory() -> Self {
        Store {
            backend: Backend::Memory(Arc::new(RwLock::new(MemoryTables::default()))),
        }
    }

    /// Brings the schema up to date. The memory backend has nothing to do.
    pub async fn migrate(&self) -> Result<(), Error> {
        match &self.backend {
            Backend::Postgres(pool) => postgres::migrate(pool).await,
            Backend::Memory(_) => Ok(()),
        }
    }

    pub async fn get_questions(
        &self,
        limit: Option<u32>,
        offset: u32,
    ) -> Result<Vec<Question>, Error> {
        let rows = match &self.backend {
            Backend::Postgres(pool) => postgres::get_questions(pool, limit, offset).await?,
            Backend::Memory(tables) => tables.read().await.get_questions(limit, offset),
        };
        rows.into_iter().map(Question::try_from).collect()
    }

    pub async fn get_question(&self, id: i32) -> Result<Question, Error> {
        let row = match &self.backend {
            Backend::Postgres(pool) => postgres::get_question(pool, id).await?,
            Backend::Memory(tables) => tables.read().await.get_question(id),
        };
        row.ok_or(Error::QuestionNotFound(id))?.try_into()
    }

    pub async fn add_question(&self, new_question: NewQuestion) -> Result<Question, Error> {
        let columns = QuestionColumns::from(new_question);
        let row = match &self.backend {
            Backend::Postgres(pool) => postgres::add_question(pool, columns).await?,
            Backend::Memory(tables) => tables.write().await.add_question(columns),
        };
        row.try_into()
    }

    /// Replaces every column of the question, so fields of a previous
    /// variant are cleared when `question_type` changes.
    pub async fn update_question(
        &self,
        id: i32,
        new_question: NewQuestion,
    ) -> Result<Question, Error> {
        let columns = QuestionColumns::from(new_question);
        let row = match &self.backend {
            Backend::Postgres(pool) => postgres::update_question(pool, id, columns).await?,
            Backend::Memory(tables) => tables.write().await.update_question(id, columns),
        };
        row.ok_or(Error::QuestionNotFound(id))?.try_into()
    }

    pub async fn delete_question(&self, id: i32) -> Result<(), Error> {
        let deleted = match &self.backend {
            Backend::Postgres(pool) => postgres::delete_question(pool, id).await?,
            Backend::Memory(tables) => tables.write().await.delete_question(id),
        };
        if deleted {
            Ok(())
        } else {
            Err(Error::QuestionNotFound(id))
        }
    }

    /// Returns the ids from `ids` that do not belong to a stored question,
    /// in the order they were given.
    pub async fn missing_question_ids(&self, ids: &[QuestionId]) -> Result<Vec<QuestionId>, Error> {
        let raw: Vec<i32> = ids.iter().map(|id| id.0).collect();
        let existing = match &self.backend {
            Backend::Postgres(pool) => postgres::existing_question_ids(pool, &raw).await?,
            Backend::Memory(tables) => tables.read().await.existing_question_ids(&raw),
        };
        Ok(ids
            .iter()
            .filter(|id| !existing.contains(&id.0))
            .copied()
            .collect())
    }

    pub async fn add_questionnaire(
        &self,
        new_questionnaire: NewQuestionnaire,
    ) -> Result<Questionnaire, Error> {
        match &self.backend {
            Backend::Postgres(pool) => postgres::add_questionnaire(pool, new_questionnaire).await,
            Backend::Memory(tables) => Ok(tables.write().await.add_questionnaire(new_questionnaire)),
        }
    }

    pub async fn get_questionnaire(&self, id: i32) -> Result<Questionnaire, Error> {
        let questionnaire = match &self.backend {
            Backend::Postgres(pool) => postgres::get_questionnaire(pool, id).await?,
            Backend::Memory(tables) => tables.read().await.get_questionnaire(id),
        };
        questionnaire.ok_or(Error::QuestionnaireNotFound(id))
    }
}

/// Variant columns of the `questions` table. Exactly the columns of the
/// active `question_type` are `Some`.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct QuestionColumns {
    pub question_text: String,
    pub question_type: String,
    pub options: Option<Vec<String>>,
    pub correct_text: Option<String>,
    pub correct_boolean: Option<bool>,
    pub correct_option_index: Option<i32>,
    pub correct_option_indices: Option<Vec<i32>>,
    pub following_question_id: Option<i32>,
}

impl From<NewQuestion> for QuestionColumns {
    fn from(question: NewQuestion) -> Self {
        let mut columns = QuestionColumns {
            question_text: question.question_text,
            question_type: question.kind.question_type().as_str().to_owned(),
            ..Default::default()
        };
        match question.kind {
            QuestionKind::Text { correct_text } => {
                columns.correct_text = Some(correct_text);
            }
            QuestionKind::YesNo {
                correct_boolean,
                following_question_id,
            } => {
                columns.correct_boolean = Some(correct_boolean);
                columns.following_question_id = following_question_id.map(|id| id.0);
            }
            QuestionKind::SingleChoice {
                options,
                correct_option_index,
            } => {
                columns.options = Some(options);
                columns.correct_option_index = Some(correct_option_index);
            }
            QuestionKind::MultiChoice {
                options,
                correct_option_indices,
            } => {
                columns.options = Some(options);
                columns.correct_option_indices = Some(correct_option_indices);
            }
        }
        columns
    }
}

/// One row of the `questions` table.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct QuestionRow {
    pub id: i32,
    pub columns: QuestionColumns,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<QuestionRow> for Question {
    type Error = Error;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        let QuestionRow {
            id,
            columns,
            created_at,
            updated_at,
        } = row;
        let missing = |column: &str| {
            Error::InvalidRecord(format!("question {} has no {}", id, column))
        };

        let question_type = columns.question_type.parse::<QuestionType>().map_err(|e| {
            Error::InvalidRecord(format!("question {} has type {:?}", id, e.0))
        })?;

        let kind = match question_type {
            QuestionType::Text => QuestionKind::Text {
                correct_text: columns.correct_text.ok_or_else(|| missing("correct_text"))?,
            },
            QuestionType::YesNo => QuestionKind::YesNo {
                correct_boolean: columns
                    .correct_boolean
                    .ok_or_else(|| missing("correct_boolean"))?,
                following_question_id: columns.following_question_id.map(QuestionId),
            },
            QuestionType::SingleChoice => QuestionKind::SingleChoice {
                options: columns.options.ok_or_else(|| missing("options"))?,
                correct_option_index: columns
                    .correct_option_index
                    .ok_or_else(|| missing("correct_option_index"))?,
            },
            QuestionType::MultiChoice => QuestionKind::MultiChoice {
                options: columns.options.ok_or_else(|| missing("options"))?,
                correct_option_indices: columns
                    .correct_option_indices
                    .ok_or_else(|| missing("correct_option_indices"))?,
            },
        };

        Ok(Question {
            id: QuestionId(id),
            question_text: columns.question_text,
            kind,
            created_at,
            updated_at,
        })
    }
}
