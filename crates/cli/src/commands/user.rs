//! Account creation command.
//!
//! ```bash
//! strive user create -e ops@strive.shop -p 'long-password' --first-name Ada --last-name Ops -r manager
//! ```

use strive_api::models::user::CreateUser;
use strive_api::services::auth::create_account;
use strive_core::Role;

use super::{CliError, connect};

/// Create an account with the given role.
///
/// Goes through the same validation and hashing as the API, and creates the
/// default notification preferences with it.
///
/// # Errors
///
/// Returns an error for an unknown role, a taken email, a weak password or a
/// database failure.
pub async fn create(
    email: &str,
    password: &str,
    first_name: &str,
    last_name: &str,
    role: &str,
) -> Result<(), CliError> {
    let role: Role = role
        .parse()
        .map_err(|_| CliError::InvalidRole(role.to_owned()))?;

    let pool = connect().await?;

    let input = CreateUser {
        email: email.to_owned(),
        password: password.to_owned(),
        first_name: first_name.to_owned(),
        last_name: last_name.to_owned(),
        phone: None,
        country_code: None,
        role: Some(role),
    };
    let user = create_account(&pool, &input, role).await?;

    tracing::info!(
        "Account created successfully! ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role
    );
    Ok(())
}
