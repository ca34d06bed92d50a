use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::error::Error;

/// Fixed issuer claim identifying this service.
pub const ISSUER: &str = "gym-ops";

/// Expiry is the sole invalidation mechanism; there is no revocation list.
const TOKEN_TTL: Duration = Duration::hours(24);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: i64,
    pub iat: i64,
    pub exp: i64,
}

/// HS256 signing and verification keys, built once at startup from the
/// base64-encoded secret and immutable afterwards.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl std::fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenKeys").finish_non_exhaustive()
    }
}

impl TokenKeys {
    /// Decodes the at-rest base64 form of the secret. A malformed secret
    /// fails here, before the first token is ever issued.
    pub fn from_base64_secret(secret: &str) -> Result<Self, Error> {
        Ok(Self {
            encoding: EncodingKey::from_base64_secret(secret)?,
            decoding: DecodingKey::from_base64_secret(secret)?,
        })
    }

    /// Issues a signed bearer token for the given user id, valid for 24 hours.
    pub fn sign(&self, user_id: i64) -> Result<String, Error> {
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            iss: ISSUER.to_string(),
            sub: user_id,
            iat: now.unix_timestamp(),
            exp: (now + TOKEN_TTL).unix_timestamp(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id, "auth token signed");
        Ok(token)
    }

    /// Verifies signature, issuer and expiry; symmetric with `sign`.
    pub fn verify(&self, token: &str) -> Result<Claims, Error> {
        let mut validation = Validation::default();
        validation.set_issuer(&[ISSUER]);
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = data.claims.sub, "auth token verified");
        Ok(data.claims)
    }
}
