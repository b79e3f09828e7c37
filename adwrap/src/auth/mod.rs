//! Identity boundary.
//!
//! Authentication happens upstream: an identity proxy validates credentials
//! and forwards the authenticated user id in a trusted header. Handlers take
//! a [`CurrentUser`] argument to require an authenticated caller, and call
//! its role guards for endpoints restricted to one side of the marketplace.

mod current_user;

pub use current_user::CurrentUser;
