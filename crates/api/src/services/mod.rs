//! Business logic services.
//!
//! Repositories own single-table rules; services cover the flows that span
//! several of them or send email.
//!
//! # Services
//!
//! - `auth` - Password login, registration, Google sign-in, password reset
//! - `email` - Notification rendering and delivery via SMTP
//! - `finance` - Financial overview over the ledger tables
//! - `orders` - Order placement, status changes and their notifications

pub mod auth;
pub mod email;
pub mod finance;
pub mod orders;

pub use auth::{AuthError, AuthService, Claims, TokenSigner};
pub use email::{EmailError, EmailService, Mailer};
pub use finance::FinanceService;
pub use orders::OrderService;
