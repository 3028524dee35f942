//! Account authentication service.
//!
//! Email + password login with Argon2id hashes, registration, Google sign-in
//! and the password reset flow. Successful logins get a signed bearer token
//! from [`TokenSigner`].

mod error;
mod token;

pub use error::AuthError;
pub use token::{Claims, TokenError, TokenSigner};

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use sqlx::PgPool;
use uuid::Uuid;

use strive_core::{Email, Role};

use crate::db::password_reset::{PasswordResetRepository, Redemption, ResetToken};
use crate::db::users::UserRepository;
use crate::models::notification_preferences::PreferenceFlags;
use crate::models::user::{AuthResponse, CreateUser, NewUser, User, clip_name};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 6;

pub use crate::models::user::MAX_EMAIL_LENGTH;

/// How long a password reset token stays valid.
pub const RESET_TOKEN_TTL_MINUTES: i64 = 30;

/// Sign-in details forwarded by the storefront after Google authentication.
#[derive(Debug, Clone)]
pub struct GoogleProfile {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Result of a Google sign-in.
#[derive(Debug, Clone)]
pub struct GoogleSignIn {
    pub response: AuthResponse,
    /// Whether the account was created by this sign-in.
    pub created: bool,
    pub user: User,
}

/// Account authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    resets: PasswordResetRepository<'a>,
    tokens: &'a TokenSigner,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, tokens: &'a TokenSigner) -> Self {
        Self {
            users: UserRepository::new(pool),
            resets: PasswordResetRepository::new(pool),
            tokens,
        }
    }

    /// Check an email and password and issue a token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown email or a wrong
    /// password, without saying which.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;
        let (user, hash) = self
            .users
            .get_credentials(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &hash) {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(&user)?;
        Ok(AuthResponse::new(user, token))
    }

    /// Register a customer account with default notification preferences.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::EmailInUse` if the email is taken, or a validation
    /// error for a bad email, password or name.
    pub async fn register(&self, input: &CreateUser) -> Result<(User, AuthResponse), AuthError> {
        let user = self.create_account(input, Role::Customer).await?;
        let token = self.tokens.issue(&user)?;
        Ok((user.clone(), AuthResponse::new(user, token)))
    }

    /// Create an account with the given role, as staff do from the back
    /// office. Default notification preferences are created with it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::EmailInUse` if the email is taken, or a validation
    /// error for a bad email, password or name.
    pub async fn create_account(&self, input: &CreateUser, role: Role) -> Result<User, AuthError> {
        insert_account(&self.users, input, role).await
    }

    /// Sign in with a Google profile, creating a customer account on first use.
    ///
    /// The new account gets a random password nobody knows, so it can only be
    /// used through Google or after a password reset.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` for a malformed email.
    pub async fn google_login(&self, profile: &GoogleProfile) -> Result<GoogleSignIn, AuthError> {
        let email = parse_email(&profile.email)?;

        let (user, created) = match self.users.get_by_email(&email).await? {
            Some(user) => (user, false),
            None => {
                let new_user = NewUser {
                    email,
                    password_hash: hash_password(&random_password())?,
                    first_name: clip_name(profile.first_name.as_deref()),
                    last_name: clip_name(profile.last_name.as_deref()),
                    phone: None,
                    country_code: None,
                    role: Role::Customer,
                };
                let user = self
                    .users
                    .create_with_preferences(&new_user, PreferenceFlags::default())
                    .await?;
                tracing::info!(user_id = %user.id, "Account created through Google sign-in");
                (user, true)
            }
        };

        let token = self.tokens.issue(&user)?;
        Ok(GoogleSignIn {
            response: AuthResponse::new(user.clone(), token),
            created,
            user,
        })
    }

    /// Issue a reset token for the account with `email`, replacing earlier
    /// ones. Returns `None` for unknown or malformed emails.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the database fails.
    pub async fn request_password_reset(
        &self,
        email: &str,
    ) -> Result<Option<(User, ResetToken)>, AuthError> {
        let Ok(email) = Email::parse(email) else {
            return Ok(None);
        };
        let Some(user) = self.users.get_by_email(&email).await? else {
            tracing::info!("Password reset requested for unknown email");
            return Ok(None);
        };

        let token = Uuid::new_v4().to_string();
        let expires_at = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);
        let reset = self.resets.issue(user.id, &token, expires_at).await?;

        Ok(Some((user, reset)))
    }

    /// Set a new password using a reset token. The token is consumed.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidResetToken` for an unknown token,
    /// `AuthError::ResetTokenExpired` for an expired one and
    /// `AuthError::WeakPassword` for a too-short password.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        check_password(new_password)?;
        let hash = hash_password(new_password)?;

        match self.resets.redeem(token, &hash, Utc::now()).await? {
            Redemption::Done => {
                tracing::info!("Password reset completed");
                Ok(())
            }
            Redemption::Unknown => Err(AuthError::InvalidResetToken),
            Redemption::Expired => Err(AuthError::ResetTokenExpired),
        }
    }
}

/// Create an account outside a request, as the `strive user create` command
/// does. Same checks as [`AuthService::create_account`].
///
/// # Errors
///
/// Returns `AuthError::EmailInUse` if the email is taken, or a validation
/// error for a bad email, password or name.
pub async fn create_account(pool: &PgPool, input: &CreateUser, role: Role) -> Result<User, AuthError> {
    insert_account(&UserRepository::new(pool), input, role).await
}

async fn insert_account(
    users: &UserRepository<'_>,
    input: &CreateUser,
    role: Role,
) -> Result<User, AuthError> {
    input.validate().map_err(AuthError::Validation)?;
    let email = parse_email(&input.email)?;
    check_password(&input.password)?;

    let new_user = NewUser {
        email,
        password_hash: hash_password(&input.password)?,
        first_name: input.first_name.trim().to_string(),
        last_name: input.last_name.trim().to_string(),
        phone: input.phone.clone().filter(|p| !p.trim().is_empty()),
        country_code: input.country_code.clone().filter(|c| !c.trim().is_empty()),
        role,
    };

    let user = users
        .create_with_preferences(&new_user, PreferenceFlags::default())
        .await?;

    tracing::info!(user_id = %user.id, role = %user.role, "Account created");
    Ok(user)
}

/// Parse an email and check it fits the column.
///
/// # Errors
///
/// Returns `AuthError::InvalidEmail` or `AuthError::EmailTooLong`.
pub fn parse_email(raw: &str) -> Result<Email, AuthError> {
    let email = Email::parse(raw)?;
    if email.as_str().chars().count() > MAX_EMAIL_LENGTH {
        return Err(AuthError::EmailTooLong);
    }
    Ok(email)
}

/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is too short.
pub fn check_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password with Argon2id and a random salt.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Whether `password` matches a stored PHC hash. Unparseable hashes never
/// match.
#[must_use]
pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

fn random_password() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn test_password_minimum_length() {
        assert!(matches!(check_password("12345"), Err(AuthError::WeakPassword(_))));
        assert!(check_password("123456").is_ok());
    }

    #[test]
    fn test_email_length_limit() {
        let long = format!("{}@strive.shop", "a".repeat(95));
        assert!(matches!(parse_email(&long), Err(AuthError::EmailTooLong)));
        assert!(parse_email("ana@strive.shop").is_ok());
        assert!(matches!(parse_email("nope"), Err(AuthError::InvalidEmail(_))));
    }

    #[test]
    fn test_random_password_shape() {
        let password = random_password();
        assert_eq!(password.len(), 32);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
