use axum::{
    Router,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use passage_core::health::healthz;
use passage_core::middleware::{propagate_request_id_layer, request_id_layer};

use crate::handlers::{account, health::readyz, two_factor};
use crate::state::AppState;
use crate::usecase::AccountPorts;

pub fn build_router<P: AccountPorts>(state: AppState<P>) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz::<P>))
        // Registration and email verification
        .route("/auth/register", post(account::register::<P>))
        .route("/auth/otp/verify", post(account::verify_otp::<P>))
        .route("/auth/otp/resend", post(account::resend_otp::<P>))
        // Sessions
        .route("/auth/login", post(account::login::<P>))
        .route("/auth/token/refresh", post(account::refresh_token::<P>))
        .route("/auth/me", get(account::me::<P>))
        // Password reset
        .route("/auth/password/forgot", post(account::forgot_password::<P>))
        .route("/auth/password/reset", post(account::reset_password::<P>))
        // Second factor
        .route("/auth/2fa/setup", post(two_factor::setup::<P>))
        .route("/auth/2fa/verify", post(two_factor::verify::<P>))
        .route("/auth/2fa/disable", post(two_factor::disable::<P>))
        .with_state(state)
        // Outermost first: the id is set before propagation reads it and
        // before the trace span opens.
        .layer(
            ServiceBuilder::new()
                .layer(request_id_layer())
                .layer(propagate_request_id_layer())
                .layer(TraceLayer::new_for_http()),
        )
}
