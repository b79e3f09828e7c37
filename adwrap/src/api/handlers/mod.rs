//! HTTP handlers.
//!
//! Handlers stay thin: extract the caller, validate ownership, delegate to a
//! repository or the billing module, and convert the DB model to its wire
//! DTO. Business rules live below this layer.

pub mod applications;
pub mod campaigns;
pub mod payments;
pub mod users;
pub mod verifications;
pub mod webhooks;

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = OK, description = "Service is up", body = str))
)]
pub async fn health() -> &'static str {
    "ok"
}
