//! HTTP middleware and request extractors.
//!
//! # Middleware Order (outermost first, see `main.rs`)
//!
//! 1. Sentry layers (hub per request, transaction per route)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. CORS for the storefront origin
//! 4. Security headers
//!
//! Authentication is not a layer: handlers opt in through the extractors in
//! [`auth`].

pub mod auth;

pub use auth::{RequireAdmin, RequireAuth, RequireStaff, ensure_self_or_staff};
