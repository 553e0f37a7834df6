use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{Level, event, instrument};
use warp::http::StatusCode;

use crate::store::Store;
use crate::types::pagination::{Pagination, extract_pagination};
use crate::types::question::QuestionPayload;
use crate::validation::validate_question;

use handle_errors::Error;

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct APIResponse {
    message: String,
}

#[instrument]
pub async fn get_questions(
    params: HashMap<String, String>,
    store: Store,
) -> Result<impl warp::Reply, warp::Rejection> {
    event!(target: "questionnaire_api", Level::INFO, "querying questions");
    let mut pagination = Pagination::default();

    if !params.is_empty() {
        event!(Level::INFO, pagination = true);
        pagination = extract_pagination(params)?;
    }

    match store
        .get_questions(pagination.limit, pagination.offset)
        .await
    {
        Ok(res) => Ok(warp::reply::json(&res)),
        Err(e) => Err(warp::reject::custom(e)),
    }
}

#[instrument]
pub async fn get_question(id: i32, store: Store) -> Result<impl warp::Reply, warp::Rejection> {
    match store.get_question(id).await {
        Ok(question) => Ok(warp::reply::json(&question)),
        Err(e) => Err(warp::reject::custom(e)),
    }
}

#[instrument]
pub async fn add_question(
    store: Store,
    payload: QuestionPayload,
) -> Result<impl warp::Reply, warp::Rejection> {
    let new_question = validate_question(payload).map_err(Error::ValidationError)?;

    match store.add_question(new_question).await {
        Ok(question) => {
            event!(Level::INFO, id = question.id.0, "question added");
            Ok(warp::reply::with_status(
                warp::reply::json(&question),
                StatusCode::CREATED,
            ))
        }
        Err(e) => Err(warp::reject::custom(e)),
    }
}

/// Full replacement: the payload has to be a complete question of the
/// type it names, and columns of any previous type are cleared.
#[instrument]
pub async fn update_question(
    id: i32,
    store: Store,
    payload: QuestionPayload,
) -> Result<impl warp::Reply, warp::Rejection> {
    let new_question = validate_question(payload).map_err(Error::ValidationError)?;

    match store.update_question(id, new_question).await {
        Ok(question) => Ok(warp::reply::json(&question)),
        Err(e) => Err(warp::reject::custom(e)),
    }
}

#[instrument]
pub async fn delete_question(id: i32, store: Store) -> Result<impl warp::Reply, warp::Rejection> {
    match store.delete_question(id).await {
        Ok(_) => Ok(warp::reply::with_status(
            warp::reply::json(&APIResponse {
                message: format!("Question with id: {} deleted successfully", id),
            }),
            StatusCode::OK,
        )),
        Err(e) => Err(warp::reject::custom(e)),
    }
}
