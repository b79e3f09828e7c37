//! # adwrap
//!
//! Backend for a vehicle sticker advertising marketplace. Advertisers fund
//! campaigns; drivers apply to carry a campaign's sticker on their vehicle,
//! prove it monthly with a photo, and get paid per verified cycle.
//!
//! ## Architecture
//!
//! - **API** ([`api`]): axum handlers over the repositories, documented with
//!   utoipa and served with an interactive explorer at `/docs`
//! - **Identity** ([`auth`]): a trusted-header boundary; credentials are
//!   checked upstream and only the user id reaches this service
//! - **Storage** ([`db`]): SQLite via sqlx, one repository per entity, with
//!   lifecycle invariants enforced by guarded single-statement writes
//! - **Billing** ([`billing`]): cycle arithmetic, the idempotent charge
//!   ledger, and settlement against a pluggable [`payment_processors`]
//!   backend
//!
//! ## Quick Start
//!
//! ```ignore
//! use adwrap::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let app = Application::new(Config::default()).await?;
//!     app.serve(std::future::pending()).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod billing;
pub mod config;
pub mod db;
pub mod errors;
pub mod openapi;
pub mod payment_processors;
pub mod retry;
pub mod telemetry;
pub mod types;

#[cfg(test)]
mod test;
#[cfg(test)]
pub(crate) mod test_utils;

pub use config::Config;
pub use types::{ApplicationId, CampaignId, PaymentId, UserId, VerificationId};

use crate::payment_processors::{PaymentProcessor, create_processor};
use anyhow::Context;
use axum::Router;
use bon::Builder;
use sqlx::SqlitePool;
use std::future::Future;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

/// Shared state available to every handler.
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
    pub processor: Arc<dyn PaymentProcessor>,
}

/// Build the full router: the API under `/api/v1`, plus the OpenAPI explorer.
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api::router(state))
        .merge(Scalar::with_url("/docs", openapi::ApiDoc::openapi()))
}

/// The assembled service: a connected database, a payment processor, and the
/// configuration they were built from.
pub struct Application {
    state: AppState,
}

impl Application {
    /// Connect to the database, run pending migrations, and wire up the
    /// configured payment processor.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let db = db::connect(&config.database.path)
            .await
            .with_context(|| format!("opening database at {}", config.database.path))?;
        db::migrator().run(&db).await.context("running migrations")?;

        let processor = create_processor(&config.payment);
        let state = AppState::builder()
            .db(db)
            .config(config)
            .processor(processor)
            .build();

        Ok(Self { state })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Serve HTTP until `shutdown` resolves.
    ///
    /// When `billing.auto_run_interval` is set, a background task runs the
    /// billing pipeline on that interval; it stops with the server.
    pub async fn serve(self, shutdown: impl Future<Output = ()> + Send + 'static) -> anyhow::Result<()> {
        if let Some(interval) = self.state.config.billing.auto_run_interval {
            let state = self.state.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
                loop {
                    ticker.tick().await;
                    if let Err(error) = run_billing_pipeline(&state).await {
                        tracing::error!(%error, "scheduled billing run failed");
                    }
                }
            });
        }

        let addr = format!("{}:{}", self.state.config.host, self.state.config.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("binding {addr}"))?;
        tracing::info!(%addr, "listening");

        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(shutdown)
            .await
            .context("serving HTTP")?;
        Ok(())
    }
}

async fn run_billing_pipeline(state: &AppState) -> errors::Result<()> {
    let summary = billing::ledger::run(&state.db, &state.config.billing, chrono::Utc::now()).await?;
    let submitted = billing::ledger::submit_pending(&state.db, state.processor.as_ref()).await?;
    let settled = billing::ledger::reconcile(&state.db, state.processor.as_ref(), &state.config.retry).await?;
    tracing::info!(
        charges = summary.charges_created,
        submitted,
        settled,
        "scheduled billing run complete"
    );
    Ok(())
}
