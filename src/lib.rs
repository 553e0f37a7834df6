#![warn(clippy::all)]

use handle_errors::return_error;
use tracing_subscriber::fmt::format::FmtSpan;
use warp::{Filter, http::Method};

pub mod config;
pub mod routes;
pub mod store;
pub mod types;
pub mod validation;

use crate::config::{Config, StorageBackend};
use crate::store::Store;

/// Every route of the service, with CORS, request tracing and error
/// recovery applied.
pub fn build_routes(
    store: Store,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let store_filter = warp::any().map(move || store.clone());

    let cors = warp::cors()
        .allow_any_origin()
        .allow_header("Content-Type")
        .allow_methods(&[Method::PUT, Method::DELETE, Method::POST, Method::GET]);

    let get_questions = warp::get()
        .and(warp::path("question"))
        .and(warp::path::end())
        .and(warp::query())
        .and(store_filter.clone())
        .and_then(routes::question::get_questions);

    let get_question = warp::get()
        .and(warp::path("question"))
        .and(warp::path::param::<i32>())
        .and(warp::path::end())
        .and(store_filter.clone())
        .and_then(routes::question::get_question);

    let add_question = warp::post()
        .and(warp::path("question"))
        .and(warp::path::end())
        .and(store_filter.clone())
        .and(warp::body::json())
        .and_then(routes::question::add_question);

    let update_question = warp::put()
        .and(warp::path("question"))
        .and(warp::path::param::<i32>())
        .and(warp::path::end())
        .and(store_filter.clone())
        .and(warp::body::json())
        .and_then(routes::question::update_question);

    let delete_question = warp::delete()
        .and(warp::path("question"))
        .and(warp::path::param::<i32>())
        .and(warp::path::end())
        .and(store_filter.clone())
        .and_then(routes::question::delete_question);

    let add_questionnaire = warp::post()
        .and(warp::path("questionnaire"))
        .and(warp::path::end())
        .and(store_filter.clone())
        .and(warp::body::json())
        .and_then(routes::questionnaire::add_questionnaire);

    let get_questionnaire = warp::get()
        .and(warp::path("questionnaire"))
        .and(warp::path::param::<i32>())
        .and(warp::path::end())
        .and(store_filter.clone())
        .and_then(routes::questionnaire::get_questionnaire);

    let health = warp::get()
        .and(warp::path("health"))
        .and(warp::path::end())
        .and_then(routes::health::health_check);

    get_questions
        .or(get_question)
        .or(add_question)
        .or(update_question)
        .or(delete_question)
        .or(add_questionnaire)
        .or(get_questionnaire)
        .or(health)
        .with(cors)
        .with(warp::trace(|info| {
            tracing::info_span!(
                "request",
                method = %info.method(),
                path = %info.path(),
                id = %uuid::Uuid::new_v4(),
            )
        }))
        .recover(return_error)
}

/// Opens the configured backend and, for PostgreSQL, runs the migrations.
pub async fn setup_store(config: &Config) -> Result<Store, handle_errors::Error> {
    let store = match config.storage {
        StorageBackend::Postgres => Store::new(&config.database_url()).await?,
        StorageBackend::Memory => Store::in_memory(),
    };

    store.migrate().await?;

    Ok(store)
}

pub fn setup_tracing(config: &Config) {
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        format!(
            "handle_errors={},questionnaire_api={},warp={}",
            config.log_level, config.log_level, config.log_level
        )
    });

    tracing_subscriber::fmt()
        // Use the filter we built above to determine which traces to record.
        .with_env_filter(log_filter)
        // Record an event when each span closes. This can be used to time our
        // routes' durations!
        .with_span_events(FmtSpan::CLOSE)
        .init();
}

pub async fn run(config: Config, store: Store) {
    let routes = build_routes(store);
    tracing::info!(
        port = config.port,
        storage = ?config.storage,
        "questionnaire-api {} listening",
        env!("CARGO_PKG_VERSION")
    );
    warp::serve(routes).run(([0, 0, 0, 0], config.port)).await;
}
