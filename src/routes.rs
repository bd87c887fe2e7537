use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

use crate::{
    handlers::{account as account_handlers, auth as auth_handlers},
    state::AppState,
};

pub fn app_router(state: Arc<AppState>) -> Router {
    // Throttling ahead of the credential checks; peer-IP keyed. The limiter
    // itself is a collaborator, the service only relies on the 429 trigger.
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(2)
            .burst_size(10)
            .finish()
            .unwrap(),
    );

    let auth = Router::new()
        .route("/register", post(auth_handlers::register))
        .route("/login", post(auth_handlers::login))
        .route("/activate/{token}", post(auth_handlers::activate))
        .route("/refresh", post(auth_handlers::refresh))
        .route("/logout", post(auth_handlers::logout))
        .route("/me", get(auth_handlers::me))
        .route_layer(GovernorLayer::new(governor_conf));

    let account = Router::new()
        .route(
            "/request-reset-password",
            post(account_handlers::request_password_reset),
        )
        .route(
            "/validate-reset-password-token/{token}",
            get(account_handlers::validate_reset_token),
        )
        .route("/reset-password", post(account_handlers::reset_password));

    Router::new()
        .nest("/auth", auth)
        .nest("/account", account)
        .with_state(state)
}
