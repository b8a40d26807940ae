use axum::{Json, extract::State, http::StatusCode};
use serde_json::Value;

use passage_core::health::readiness;

use crate::domain::repository::{CodeStore, UserRepository};
use crate::state::AppState;
use crate::usecase::AccountPorts;

/// `GET /readyz`: PostgreSQL and Redis reachability.
pub async fn readyz<P: AccountPorts>(
    State(state): State<AppState<P>>,
) -> (StatusCode, Json<Value>) {
    let (database, redis) = tokio::join!(
        state.service.users().ping(),
        state.service.codes().ping()
    );
    readiness(&[("database", database), ("redis", redis)])
}
