use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::error::Error;

/// Hashes a plaintext password with Argon2 and a fresh random salt.
///
/// Fails only on internal failure, never on the content of `plain`.
pub fn hash_password(plain: &str) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            Error::Encoding(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// Verifies a plaintext candidate against a stored hash.
///
/// A wrong password is `Ok(false)`, not an error; `Err` means the stored
/// hash is malformed or corrupt. Callers must collapse both the mismatch
/// and the not-found case into the same generic response.
pub fn verify_password(plain: &str, hash: &str) -> Result<bool, Error> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        Error::Encoding(e.to_string())
    })?;
    match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => {
            error!(error = %e, "argon2 verify error");
            Err(Error::Encoding(e.to_string()))
        }
    }
}
