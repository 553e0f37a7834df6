use serde::Serialize;
use warp::{
    Rejection, Reply,
    filters::{body::BodyDeserializeError, cors::CorsForbidden},
    http::StatusCode,
    reject::Reject,
};

use config::ConfigError;
use sqlx::migrate::MigrateError;

use tracing::{Level, event, instrument};

#[derive(Debug)]
pub enum Error {
    ParseError(std::num::ParseIntError),
    ValidationError(Vec<FieldError>),
    QuestionNotFound(i32),
    QuestionnaireNotFound(i32),
    DatabaseQueryError(sqlx::Error),
    MigrationError(MigrateError),
    ConfigurationError(ConfigError),
    // A stored row whose columns do not describe exactly one question variant.
    InvalidRecord(String),
}

/// One violated constraint, reported back to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        FieldError {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::ParseError(err) => {
                write!(f, "Cannot parse parameter: {}", err)
            }
            Error::ValidationError(errors) => {
                write!(f, "Validation failed with {} error(s)", errors.len())
            }
            Error::QuestionNotFound(id) => {
                write!(f, "Question with id {} not found", id)
            }
            Error::QuestionnaireNotFound(id) => {
                write!(f, "Questionnaire with id {} not found", id)
            }
            Error::DatabaseQueryError(_) => {
                write!(f, "Cannot update, invalid data.")
            }
            Error::MigrationError(err) => {
                write!(f, "Cannot migrate data: {}", err)
            }
            Error::ConfigurationError(err) => {
                write!(f, "Cannot read configuration: {}", err)
            }
            Error::InvalidRecord(reason) => {
                write!(f, "Stored record is inconsistent: {}", reason)
            }
        }
    }
}

impl Reject for Error {}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    message: String,
    #[serde(skip_serializing_if = "no_field_errors")]
    errors: &'a [FieldError],
}

fn no_field_errors(errors: &&[FieldError]) -> bool {
    errors.is_empty()
}

fn error_reply(
    message: impl Into<String>,
    errors: &[FieldError],
    status: StatusCode,
) -> warp::reply::WithStatus<warp::reply::Json> {
    let body = ErrorBody {
        message: message.into(),
        errors,
    };
    warp::reply::with_status(warp::reply::json(&body), status)
}

#[instrument]
pub async fn return_error(r: Rejection) -> Result<impl Reply, Rejection> {
    if let Some(crate::Error::ValidationError(errors)) = r.find::<Error>() {
        event!(Level::INFO, errors = errors.len(), "Validation failed");
        Ok(error_reply(
            "Validation failed",
            errors,
            StatusCode::UNPROCESSABLE_ENTITY,
        ))
    } else if let Some(error @ crate::Error::QuestionNotFound(_)) = r.find::<Error>() {
        event!(Level::INFO, "{}", error);
        Ok(error_reply(error.to_string(), &[], StatusCode::NOT_FOUND))
    } else if let Some(error @ crate::Error::QuestionnaireNotFound(_)) = r.find::<Error>() {
        event!(Level::INFO, "{}", error);
        Ok(error_reply(error.to_string(), &[], StatusCode::NOT_FOUND))
    } else if let Some(crate::Error::DatabaseQueryError(e)) = r.find::<Error>() {
        event!(Level::ERROR, "Database query error: {}", e);
        Ok(error_reply(
            "Internal Server Error",
            &[],
            StatusCode::INTERNAL_SERVER_ERROR,
        ))
    } else if let Some(error @ crate::Error::InvalidRecord(_)) = r.find::<Error>() {
        event!(Level::ERROR, "{}", error);
        Ok(error_reply(
            "Internal Server Error",
            &[],
            StatusCode::INTERNAL_SERVER_ERROR,
        ))
    } else if let Some(error @ crate::Error::ParseError(_)) = r.find::<Error>() {
        event!(Level::WARN, "{}", error);
        Ok(error_reply(error.to_string(), &[], StatusCode::BAD_REQUEST))
    } else if let Some(error) = r.find::<CorsForbidden>() {
        event!(Level::ERROR, "CORS forbidden error: {}", error);
        Ok(error_reply(error.to_string(), &[], StatusCode::FORBIDDEN))
    } else if let Some(error) = r.find::<BodyDeserializeError>() {
        event!(Level::ERROR, "Cannot deserialize request body: {}", error);
        Ok(error_reply(
            error.to_string(),
            &[],
            StatusCode::UNPROCESSABLE_ENTITY,
        ))
    } else if let Some(error) = r.find::<Error>() {
        event!(Level::ERROR, "{}", error);
        Ok(error_reply(
            error.to_string(),
            &[],
            StatusCode::INTERNAL_SERVER_ERROR,
        ))
    } else {
        event!(Level::WARN, "Requested route was not found");
        Ok(error_reply("Not Found", &[], StatusCode::NOT_FOUND))
    }
}
