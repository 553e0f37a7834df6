use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};

use handle_errors::Error;

use super::{QuestionColumns, QuestionRow};
use crate::types::question::QuestionId;
use crate::types::questionnaire::{NewQuestionnaire, Questionnaire, QuestionnaireId};

const QUESTION_COLUMNS: &str = "id, question_text, question_type, options, correct_text, \
     correct_boolean, correct_option_index, correct_option_indices, following_question_id, \
     created_at, updated_at";

pub(super) async fn connect(db_url: &str) -> Result<PgPool, Error> {
    match PgPoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await
    {
        Ok(pool) => Ok(pool),
        Err(e) => {
            tracing::event!(tracing::Level::ERROR, "Cannot connect to database: {:?}", e);
            Err(Error::DatabaseQueryError(e))
        }
    }
}

pub(super) async fn migrate(pool: &PgPool) -> Result<(), Error> {
    sqlx::migrate!()
        .run(pool)
        .await
        .map_err(Error::MigrationError)
}

fn question_row(row: PgRow) -> QuestionRow {
    QuestionRow {
        id: row.get("id"),
        columns: QuestionColumns {
            question_text: row.get("question_text"),
            question_type: row.get("question_type"),
            options: row.get("options"),
            correct_text: row.get("correct_text"),
            correct_boolean: row.get("correct_boolean"),
            correct_option_index: row.get("correct_option_index"),
            correct_option_indices: row.get("correct_option_indices"),
            following_question_id: row.get("following_question_id"),
        },
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn questionnaire(row: PgRow) -> Questionnaire {
    let question_ids: Vec<i32> = row.get("question_ids");
    Questionnaire {
        id: QuestionnaireId(row.get("id")),
        title: row.get("title"),
        description: row.get("description"),
        question_ids: question_ids.into_iter().map(QuestionId).collect(),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn query_failed(error: sqlx::Error) -> Error {
    tracing::event!(tracing::Level::ERROR, "{:?}", error);
    Error::DatabaseQueryError(error)
}

pub(super) async fn get_questions(
    pool: &PgPool,
    limit: Option<u32>,
    offset: u32,
) -> Result<Vec<QuestionRow>, Error> {
    // A NULL limit makes PostgreSQL return every row.
    sqlx::query(&format!(
        "SELECT {} FROM questions ORDER BY id LIMIT $1 OFFSET $2",
        QUESTION_COLUMNS
    ))
    .bind(limit.map(i64::from))
    .bind(i64::from(offset))
    .map(question_row)
    .fetch_all(pool)
    .await
    .map_err(query_failed)
}

pub(super) async fn get_question(pool: &PgPool, id: i32) -> Result<Option<QuestionRow>, Error> {
    sqlx::query(&format!(
        "SELECT {} FROM questions WHERE id = $1",
        QUESTION_COLUMNS
    ))
    .bind(id)
    .map(question_row)
    .fetch_optional(pool)
    .await
    .map_err(query_failed)
}

pub(super) async fn add_question(
    pool: &PgPool,
    columns: QuestionColumns,
) -> Result<QuestionRow, Error> {
    match sqlx::query(&format!(
        "INSERT INTO questions (question_text, question_type, options, correct_text,
            correct_boolean, correct_option_index, correct_option_indices, following_question_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {}",
        QUESTION_COLUMNS
    ))
    .bind(columns.question_text)
    .bind(columns.question_type)
    .bind(columns.options)
    .bind(columns.correct_text)
    .bind(columns.correct_boolean)
    .bind(columns.correct_option_index)
    .bind(columns.correct_option_indices)
    .bind(columns.following_question_id)
    .map(question_row)
    .fetch_one(pool)
    .await
    {
        Ok(row) => Ok(row),
        Err(e) => Err(query_failed(e)),
    }
}

pub(super) async fn update_question(
    pool: &PgPool,
    id: i32,
    columns: QuestionColumns,
) -> Result<Option<QuestionRow>, Error> {
    // Every variant column is written, so switching question_type nulls
    // whatever the previous type had set.
    match sqlx::query(&format!(
        "UPDATE questions
        SET question_text = $1, question_type = $2, options = $3, correct_text = $4,
            correct_boolean = $5, correct_option_index = $6, correct_option_indices = $7,
            following_question_id = $8, updated_at = NOW()
        WHERE id = $9
        RETURNING {}",
        QUESTION_COLUMNS
    ))
    .bind(columns.question_text)
    .bind(columns.question_type)
    .bind(columns.options)
    .bind(columns.correct_text)
    .bind(columns.correct_boolean)
    .bind(columns.correct_option_index)
    .bind(columns.correct_option_indices)
    .bind(columns.following_question_id)
    .bind(id)
    .map(question_row)
    .fetch_optional(pool)
    .await
    {
        Ok(row) => Ok(row),
        Err(e) => Err(query_failed(e)),
    }
}

pub(super) async fn delete_question(pool: &PgPool, id: i32) -> Result<bool, Error> {
    match sqlx::query("DELETE FROM questions WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
    {
        Ok(result) => Ok(result.rows_affected() > 0),
        Err(e) => Err(query_failed(e)),
    }
}

pub(super) async fn existing_question_ids(pool: &PgPool, ids: &[i32]) -> Result<Vec<i32>, Error> {
    sqlx::query("SELECT id FROM questions WHERE id = ANY($1)")
        .bind(ids.to_vec())
        .map(|row: PgRow| row.get::<i32, _>("id"))
        .fetch_all(pool)
        .await
        .map_err(query_failed)
}

pub(super) async fn add_questionnaire(
    pool: &PgPool,
    new_questionnaire: NewQuestionnaire,
) -> Result<Questionnaire, Error> {
    let question_ids: Vec<i32> = new_questionnaire
        .question_ids
        .iter()
        .map(|id| id.0)
        .collect();

    match sqlx::query(
        "INSERT INTO questionnaires (title, description, question_ids)
        VALUES ($1, $2, $3)
        RETURNING id, title, description, question_ids, created_at, updated_at",
    )
    .bind(new_questionnaire.title)
    .bind(new_questionnaire.description)
    .bind(question_ids)
    .map(questionnaire)
    .fetch_one(pool)
    .await
    {
        Ok(questionnaire) => Ok(questionnaire),
        Err(e) => Err(query_failed(e)),
    }
}

pub(super) async fn get_questionnaire(
    pool: &PgPool,
    id: i32,
) -> Result<Option<Questionnaire>, Error> {
    sqlx::query(
        "SELECT id, title, description, question_ids, created_at, updated_at
        FROM questionnaires WHERE id = $1",
    )
    .bind(id)
    .map(questionnaire)
    .fetch_optional(pool)
    .await
    .map_err(query_failed)
}
