use serde_json::json;

pub async fn health_check() -> Result<impl warp::Reply, warp::Rejection> {
    Ok(warp::reply::json(&json!({ "status": "healthy" })))
}
