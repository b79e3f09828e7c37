//! Request/response types for the HTTP API.
//!
//! These are the wire DTOs; database models live in [`crate::db::models`].
//! Each response type converts from its DB counterpart, which keeps storage
//! details (integer cents, JSON-encoded zip sets) out of the wire contract.

pub mod applications;
pub mod campaigns;
pub mod pagination;
pub mod payments;
pub mod users;
pub mod verifications;

pub use applications::{ApplicationCreateRequest, ApplicationResponse};
pub use campaigns::{CampaignCreateRequest, CampaignResponse, CampaignUpdateRequest};
pub use pagination::Pagination;
pub use payments::{BillingRunRequest, BillingRunResponse, PaymentResponse, SettlementCallback, SettlementOutcome};
pub use users::{UserCreateRequest, UserResponse, UserUpdateRequest};
pub use verifications::{VerificationResponse, VerificationReviewRequest, VerificationSubmitRequest};
