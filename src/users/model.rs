use serde::Serialize;
use time::OffsetDateTime;

use crate::auth::password::{hash_password, verify_password};
use crate::error::Error;
use crate::validator::{is_valid_email, Validator};

/// Password credential with a two-phase lifecycle: the input phase holds the
/// transient plaintext alongside the hash computed from it; the persisted
/// phase holds the hash alone. The fields are private so plaintext cannot
/// leak past this type.
#[derive(Debug, Clone, Default)]
pub struct Credential {
    plaintext: Option<String>,
    hash: Option<String>,
}

impl Credential {
    /// Rebuilds the persisted phase from a hash loaded out of storage.
    pub fn from_hash(hash: String) -> Self {
        Self {
            plaintext: None,
            hash: Some(hash),
        }
    }

    /// Hashes the plaintext and enters the input phase.
    pub fn set(&mut self, plaintext: &str) -> Result<(), Error> {
        let hash = hash_password(plaintext)?;
        self.plaintext = Some(plaintext.to_string());
        self.hash = Some(hash);
        Ok(())
    }

    /// Checks a plaintext candidate against the stored hash.
    pub fn matches(&self, plaintext: &str) -> Result<bool, Error> {
        verify_password(plaintext, self.hash())
    }

    pub fn plaintext(&self) -> Option<&str> {
        self.plaintext.as_deref()
    }

    pub fn has_hash(&self) -> bool {
        self.hash.is_some()
    }

    /// Panics when no hash has been set. A credential reaching the
    /// persistence boundary without a hash means the orchestration layer
    /// skipped hashing, a programmer contract violation rather than a
    /// recoverable runtime condition.
    pub fn hash(&self) -> &str {
        self.hash
            .as_deref()
            .expect("missing password hash for user")
    }

    /// Discards the transient plaintext once the hash has been persisted.
    pub fn clear_plaintext(&mut self) {
        self.plaintext = None;
    }
}

/// Durable identity record. Serializes outward without password material;
/// the hash crosses only the storage boundary.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub fullname: String,
    pub email: String,
    #[serde(skip)]
    pub password: Credential,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl User {
    /// A user pending insertion; id and timestamps are assigned by storage.
    pub fn new(fullname: impl Into<String>, email: impl Into<String>) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: 0,
            fullname: fullname.into(),
            email: email.into(),
            password: Credential::default(),
            created_at: now,
            updated_at: now,
        }
    }
}

pub fn validate_email(v: &mut Validator, email: &str) {
    v.check(!email.is_empty(), "email", "email is required");
    v.check(is_valid_email(email), "email", "invalid email format");
}

pub fn validate_password_plaintext(v: &mut Validator, password: &str) {
    v.check(!password.is_empty(), "password", "password is required");
    v.check(
        password.len() >= 8,
        "password",
        "password must be at least 8 characters",
    );
}

/// Structural checks on a user entity. Password content is only checkable
/// while the transient plaintext is present (registration and
/// password-change flows).
pub fn validate_user(v: &mut Validator, user: &User) {
    v.check(!user.fullname.is_empty(), "fullname", "fullname is required");
    v.check(
        user.fullname.len() >= 10,
        "fullname",
        "fullname must be at least 10 characters",
    );

    validate_email(v, &user.email);

    if let Some(plaintext) = user.password.plaintext() {
        validate_password_plaintext(v, plaintext);
    }

    if !user.password.has_hash() {
        panic!("missing password hash for user");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_user() -> User {
        let mut user = User::new("Jane Doe Smith", "jane@example.com");
        user.password.set("longpassword1").expect("hash");
        user
    }

    #[test]
    fn credential_lifecycle() {
        let mut cred = Credential::default();
        assert!(!cred.has_hash());

        cred.set("longpassword1").expect("hash");
        assert_eq!(cred.plaintext(), Some("longpassword1"));
        assert!(cred.has_hash());
        assert!(cred.matches("longpassword1").unwrap());
        assert!(!cred.matches("wrongpass").unwrap());

        cred.clear_plaintext();
        assert_eq!(cred.plaintext(), None);
        assert!(cred.has_hash());
    }

    #[test]
    fn serialized_user_has_no_password_field() {
        let user = valid_user();
        let json = serde_json::to_value(&user).expect("serialize");
        let obj = json.as_object().expect("object");
        assert!(obj.contains_key("id"));
        assert!(obj.contains_key("fullname"));
        assert!(obj.contains_key("email"));
        assert!(obj.contains_key("created_at"));
        assert!(obj.contains_key("updated_at"));
        assert!(!obj.contains_key("password"));
        assert_eq!(obj.len(), 5);
    }

    #[test]
    fn valid_user_passes() {
        let mut v = Validator::new();
        validate_user(&mut v, &valid_user());
        assert!(v.is_valid());
    }

    #[test]
    fn short_fullname_fails_on_fullname_field() {
        let mut v = Validator::new();
        let mut user = valid_user();
        user.fullname = "Jane Doe".into(); // 8 < 10
        validate_user(&mut v, &user);
        assert!(v.into_errors().contains_key("fullname"));
    }

    #[test]
    fn fullname_of_length_nine_fails() {
        let mut v = Validator::new();
        let mut user = valid_user();
        user.fullname = "Jane Does".into(); // exactly 9
        validate_user(&mut v, &user);
        assert!(v.into_errors().contains_key("fullname"));
    }

    #[test]
    fn bad_email_fails_on_email_field() {
        let mut v = Validator::new();
        let mut user = valid_user();
        user.email = "not-an-email".into();
        validate_user(&mut v, &user);
        assert!(v.into_errors().contains_key("email"));
    }

    #[test]
    fn short_password_fails_on_password_field() {
        let mut v = Validator::new();
        let mut user = valid_user();
        user.password.set("short12").expect("hash"); // 7 < 8
        validate_user(&mut v, &user);
        assert!(v.into_errors().contains_key("password"));
    }

    #[test]
    fn all_violations_are_accumulated() {
        let mut v = Validator::new();
        let mut user = User::new("Jane Does", "not-an-email");
        user.password.set("short12").expect("hash");
        validate_user(&mut v, &user);

        let errors = v.into_errors();
        assert!(errors.contains_key("fullname"));
        assert!(errors.contains_key("email"));
        assert!(errors.contains_key("password"));
        assert_eq!(errors.len(), 3);
    }

    #[test]
    #[should_panic(expected = "missing password hash for user")]
    fn missing_hash_is_a_contract_violation() {
        let mut v = Validator::new();
        let user = User::new("Jane Doe Smith", "jane@example.com");
        validate_user(&mut v, &user);
    }
}
