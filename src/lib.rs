//! Stateless bearer-token authentication for axum services.
//!
//! The pipeline lives in [`services::auth`]: a [`TokenGuard`] extracts a
//! credential from the request, verifies it, resolves the principal named by
//! the configured identity claim and either yields an
//! [`AuthenticatedToken`] or a failure reply. [`middleware::auth::access`]
//! runs the guard in front of a router.
//!
//! [`TokenGuard`]: services::auth::TokenGuard
//! [`AuthenticatedToken`]: services::auth::AuthenticatedToken

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;
