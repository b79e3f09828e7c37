//! Repository implementations for database access.
//!
//! Each repository wraps a SQLx connection, provides strongly-typed
//! operations, and returns models from [`crate::db::models`].
//!
//! # Available Repositories
//!
//! - [`Users`]: advertiser and driver account records
//! - [`Campaigns`]: campaign CRUD plus driver eligibility matching
//! - [`Applications`]: application lifecycle state machine
//! - [`Verifications`]: photo verification submission and review
//! - [`Payments`]: payment records and their settlement lifecycle
//!
//! # Common Pattern
//!
//! ```ignore
//! use adwrap::db::handlers::{Repository, Users};
//!
//! async fn example(pool: &sqlx::SqlitePool) -> adwrap::errors::Result<()> {
//!     let mut conn = pool.acquire().await.map_err(adwrap::db::errors::DbError::from)?;
//!     let mut repo = Users::new(&mut conn);
//!     let user = repo.get_by_id(some_id).await?;
//!     Ok(())
//! }
//! ```

pub mod applications;
pub mod campaigns;
pub mod payments;
pub mod repository;
pub mod users;
pub mod verifications;

pub use applications::Applications;
pub use campaigns::Campaigns;
pub use payments::Payments;
pub use repository::Repository;
pub use users::Users;
pub use verifications::Verifications;
