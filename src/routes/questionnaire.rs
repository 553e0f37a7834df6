use tracing::{Level, event, instrument};
use warp::http::StatusCode;

use crate::store::Store;
use crate::types::questionnaire::NewQuestionnaire;
use crate::validation::validate_questionnaire;

use handle_errors::{Error, FieldError};

#[instrument]
pub async fn add_questionnaire(
    store: Store,
    new_questionnaire: NewQuestionnaire,
) -> Result<impl warp::Reply, warp::Rejection> {
    let mut errors = match validate_questionnaire(new_questionnaire.clone()) {
        Ok(_) => Vec::new(),
        Err(errors) => errors,
    };

    let missing = store
        .missing_question_ids(&new_questionnaire.question_ids)
        .await?;
    errors.extend(missing.into_iter().map(|id| {
        FieldError::new(
            "question_ids",
            format!("question with id {} does not exist", id.0),
        )
    }));

    if !errors.is_empty() {
        return Err(warp::reject::custom(Error::ValidationError(errors)));
    }

    match store.add_questionnaire(new_questionnaire).await {
        Ok(questionnaire) => {
            event!(Level::INFO, id = questionnaire.id.0, "questionnaire added");
            Ok(warp::reply::with_status(
                warp::reply::json(&questionnaire),
                StatusCode::CREATED,
            ))
        }
        Err(e) => Err(warp::reject::custom(e)),
    }
}

#[instrument]
pub async fn get_questionnaire(
    id: i32,
    store: Store,
) -> Result<impl warp::Reply, warp::Rejection> {
    match store.get_questionnaire(id).await {
        Ok(questionnaire) => Ok(warp::reply::json(&questionnaire)),
        Err(e) => Err(warp::reject::custom(e)),
    }
}
