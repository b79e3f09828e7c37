//! HTTP API surface: routes, handlers, and wire models.

pub mod handlers;
pub mod models;

use crate::AppState;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/users", post(handlers::users::create_user))
        .route(
            "/users/current",
            get(handlers::users::get_current_user).patch(handlers::users::update_current_user),
        )
        .route(
            "/campaigns",
            post(handlers::campaigns::create_campaign).get(handlers::campaigns::list_campaigns),
        )
        .route("/campaigns/available", get(handlers::campaigns::list_available_campaigns))
        .route(
            "/campaigns/{id}",
            get(handlers::campaigns::get_campaign).patch(handlers::campaigns::update_campaign),
        )
        .route("/campaigns/{id}/applications", post(handlers::applications::create_application))
        .route("/campaigns/{id}/verifications", post(handlers::verifications::submit_verification))
        .route("/applications", get(handlers::applications::list_applications))
        .route("/applications/{id}/approve", post(handlers::applications::approve_application))
        .route("/applications/{id}/reject", post(handlers::applications::reject_application))
        .route("/applications/{id}/complete", post(handlers::applications::complete_application))
        .route("/verifications", get(handlers::verifications::list_verifications))
        .route("/verifications/{id}/review", post(handlers::verifications::review_verification))
        .route("/payments", get(handlers::payments::list_payments))
        .route("/payments/{id}/retry", post(handlers::payments::retry_payment))
        .route("/billing/run", post(handlers::payments::run_billing))
        .route("/webhooks/payments", post(handlers::webhooks::payment_settlement))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
