//! Liveness endpoints

use axum::Json;
use serde_json::{json, Value};

pub async fn index() -> &'static str {
    "Hello World!"
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
