use axum::Json;
use axum::http::StatusCode;
use serde_json::{Map, Value};

/// Handler for `GET /healthz`: liveness check.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Fold named dependency probes into a readiness response.
///
/// 200 when every probe passed, 503 otherwise. The body lists each probe as
/// `"ok"` or `"unavailable"`.
pub fn readiness(checks: &[(&'static str, bool)]) -> (StatusCode, Json<Value>) {
    let mut body = Map::new();
    for (name, ok) in checks {
        let state = if *ok { "ok" } else { "unavailable" };
        body.insert((*name).to_owned(), Value::from(state));
    }
    let status = if checks.iter().all(|(_, ok)| *ok) {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(Value::Object(body)))
}
