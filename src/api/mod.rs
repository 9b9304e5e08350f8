//! API layer
//!
//! HTTP handlers for:
//! - Authentication and profiles
//! - Community board (posts/comments/counters)
//! - Diagnosis flow and local history
//! - Directories (products/experts) and reviews
//! - Metrics (Prometheus)

mod auth;
mod board;
mod catalog;
mod diagnosis;
pub mod metrics;
mod reviews;

pub use auth::auth_router;
pub use board::board_router;
pub use catalog::catalog_router;
pub use diagnosis::diagnosis_router;
pub use metrics::metrics_router;
pub use reviews::reviews_router;
