use crate::db::errors::DbError;
use crate::types::{CampaignId, PaymentId, UserId};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Authentication required but not provided
    #[error("Not authenticated")]
    Unauthenticated { message: Option<String> },

    /// Caller's role does not permit the operation
    #[error("Operation requires the {required} role")]
    Forbidden { required: &'static str },

    /// Malformed input or business rule violation, rejected before any mutation
    #[error("{message}")]
    Validation { message: String },

    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// State conflict; retryable after the caller refreshes its view
    #[error(transparent)]
    Conflict(#[from] ConflictError),

    /// External collaborator (payment processor, object storage) unavailable
    #[error("External service {service} failed: {message}")]
    ExternalService { service: String, message: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Conflicts carry the offending entity ids so callers can decide on remediation.
#[derive(ThisError, Debug)]
pub enum ConflictError {
    /// A non-rejected application already exists for this (driver, campaign) pair
    #[error("Driver {driver_id} already has an active application for campaign {campaign_id}")]
    DuplicateApplication { driver_id: UserId, campaign_id: CampaignId },

    /// The campaign has no remaining sticker slots
    #[error("Campaign {campaign_id} has no remaining capacity")]
    CapacityExceeded { campaign_id: CampaignId },

    /// An open photo verification already exists for this (driver, campaign) pair
    #[error("Driver {driver_id} already has a pending verification for campaign {campaign_id}")]
    VerificationAlreadyPending { driver_id: UserId, campaign_id: CampaignId },

    /// The requested lifecycle transition is not allowed from the current state
    #[error("Cannot move {entity} {id} from {from} to {to}")]
    InvalidTransition {
        entity: &'static str,
        id: String,
        from: String,
        to: String,
    },

    /// A failed payment has exhausted its retry budget
    #[error("Payment {payment_id} has exhausted its {max_attempts} retry attempts")]
    RetriesExhausted { payment_id: PaymentId, max_attempts: u32 },
}

impl ConflictError {
    /// Machine-readable kind for the structured error body.
    pub fn kind(&self) -> &'static str {
        match self {
            ConflictError::DuplicateApplication { .. } => "duplicate_application",
            ConflictError::CapacityExceeded { .. } => "capacity_exceeded",
            ConflictError::VerificationAlreadyPending { .. } => "verification_already_pending",
            ConflictError::InvalidTransition { .. } => "invalid_transition",
            ConflictError::RetriesExhausted { .. } => "retries_exhausted",
        }
    }
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Error::Forbidden { .. } => StatusCode::FORBIDDEN,
            Error::Validation { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::ExternalService { .. } => StatusCode::BAD_GATEWAY,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::ForeignKeyViolation { .. } | DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated { message } => message
                .clone()
                .unwrap_or_else(|| "Authentication required".to_string()),
            Error::Forbidden { required } => format!("Operation requires the {required} role"),
            Error::Validation { message } => message.clone(),
            Error::NotFound { resource, id } => format!("{resource} with ID {id} not found"),
            Error::Conflict(conflict) => conflict.to_string(),
            Error::ExternalService { service, .. } => {
                format!("{service} is temporarily unavailable, please retry later")
            }
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { .. } => "Resource already exists".to_string(),
                DbError::ForeignKeyViolation { .. } => "Invalid reference to related resource".to_string(),
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
            Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Database(_) => {
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::ExternalService { .. } => {
                tracing::warn!("External service error: {}", self);
            }
            Error::Conflict(_) => {
                tracing::warn!("Conflict error: {}", self);
            }
            Error::Unauthenticated { .. } | Error::Forbidden { .. } => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::Validation { .. } | Error::NotFound { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();

        match &self {
            // Conflicts get a structured JSON body so clients can branch on the kind
            Error::Conflict(conflict) => {
                let body = json!({
                    "kind": conflict.kind(),
                    "message": conflict.to_string(),
                });
                (status, axum::response::Json(body)).into_response()
            }
            _ => (status, self.user_message()).into_response(),
        }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
