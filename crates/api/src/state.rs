//! Application state shared across handlers.

use std::sync::Arc;

use chrono::Duration;
use sqlx::PgPool;

use crate::config::ApiConfig;
use crate::services::auth::TokenSigner;
use crate::services::email::{EmailService, Mailer};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: PgPool,
    mailer: Mailer,
    tokens: TokenSigner,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - API configuration
    /// * `pool` - `PostgreSQL` connection pool
    ///
    /// # Errors
    ///
    /// Returns an error if the SMTP relay cannot be set up.
    pub fn new(
        config: ApiConfig,
        pool: PgPool,
    ) -> Result<Self, lettre::transport::smtp::Error> {
        let email = config.email.as_ref().map(EmailService::new).transpose()?;
        if email.is_none() {
            tracing::warn!("SMTP_HOST not set, outgoing email is disabled");
        }
        let mailer = Mailer::new(email, config.frontend_url.clone());
        let tokens = TokenSigner::new(
            config.token.secret.clone(),
            Duration::hours(config.token.ttl_hours),
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                mailer,
                tokens,
            }),
        })
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the notification mailer.
    #[must_use]
    pub fn mailer(&self) -> &Mailer {
        &self.inner.mailer
    }

    /// Get a reference to the bearer token signer.
    #[must_use]
    pub fn tokens(&self) -> &TokenSigner {
        &self.inner.tokens
    }
}
