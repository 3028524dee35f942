//! Strive Core - Shared domain types and pure business rules.
//!
//! This crate provides the types used across all Strive back-office components:
//! - `api` - REST server for the storefront frontend and the back-office UI
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types, traits and pure functions - no I/O, no
//! database access, no HTTP. Anything that can be decided without touching the
//! database (display-order planning, catalog filtering, ledger arithmetic) lives
//! here so it can be tested in isolation.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, roles and statuses
//! - [`ordering`] - Display-order planning for reorderable lists
//! - [`search`] - In-memory catalog filtering, sorting and pagination
//! - [`ledger`] - Reporting windows and revenue/growth arithmetic

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod ledger;
pub mod ordering;
pub mod search;
pub mod types;

pub use types::*;
