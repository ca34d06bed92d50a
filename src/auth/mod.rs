//! Credential hashing and bearer-token issuance.

pub mod password;
pub mod token;
