use tracing::info;

use crate::auth::token::TokenKeys;
use crate::error::Error;
use crate::users::dto::{LoginRequest, RegisterRequest};
use crate::users::model::{validate_user, User};
use crate::users::repo::UserRepo;
use crate::validator::Validator;

/// Registers a new user: hash the password, validate the entity, insert.
/// The transient plaintext is discarded once the record is persisted.
pub async fn register(repo: &dyn UserRepo, req: RegisterRequest) -> Result<User, Error> {
    let mut user = User::new(req.fullname.trim(), req.email.trim().to_lowercase());
    user.password.set(&req.password)?;

    let mut v = Validator::new();
    validate_user(&mut v, &user);
    if !v.is_valid() {
        return Err(Error::Validation(v.into_errors()));
    }

    repo.insert(&mut user).await?;
    user.password.clear_plaintext();

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok(user)
}

/// Logs a user in and issues a bearer token. An unknown email and a wrong
/// password both come back as `InvalidCredentials`; the caller cannot tell
/// which happened.
pub async fn login(
    repo: &dyn UserRepo,
    keys: &TokenKeys,
    req: LoginRequest,
) -> Result<String, Error> {
    let email = req.email.trim().to_lowercase();
    let user = match repo.find_by_email(&email).await {
        Ok(user) => user,
        Err(Error::NotFound) => return Err(Error::InvalidCredentials),
        Err(e) => return Err(e),
    };

    if !user.password.matches(&req.password)? {
        return Err(Error::InvalidCredentials);
    }

    let token = keys.sign(user.id)?;
    info!(user_id = user.id, "user logged in");
    Ok(token)
}
