//! Authentication
//!
//! Handles:
//! - HMAC-signed session tokens
//! - Session/profile binding (identity resolution)
//! - Authentication middleware

mod binder;
pub(crate) mod middleware;
pub mod session;

pub use binder::{Identity, SessionBinder};
pub use middleware::CurrentUser;
pub use session::{Session, create_session_token, verify_session_token};
