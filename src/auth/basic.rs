//! HTTP Basic credentials and the configured user directory.

use std::collections::HashMap;

use anyhow::Context;
use argon2::{
    password_hash::{PasswordHash, PasswordVerifier},
    Argon2,
};
use base64::{engine::general_purpose::STANDARD as B64, Engine as _};

use crate::config::UserCredentials;

/// Compared against when the username is unknown; matches no password.
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$bXlkYXktZHVtbXktc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Parse an `Authorization` header value of the form `Basic base64(user:pass)`.
pub fn parse_basic(header_value: &str) -> Option<Credentials> {
    let encoded = header_value.strip_prefix("Basic ")?;
    let decoded = B64.decode(encoded.trim()).ok()?;
    let text = String::from_utf8(decoded).ok()?;
    let (username, password) = text.split_once(':')?;

    Some(Credentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// Users allowed to access the service, keyed by username.
pub struct UserDirectory {
    hashes: HashMap<String, String>,
}

impl UserDirectory {
    /// Every stored hash is checked to be a well-formed PHC string up front.
    pub fn new(users: Vec<UserCredentials>) -> anyhow::Result<Self> {
        let mut hashes = HashMap::with_capacity(users.len());
        for user in users {
            PasswordHash::new(&user.password_hash)
                .map_err(|e| anyhow::anyhow!("{e}"))
                .with_context(|| format!("invalid password hash for {}", user.username))?;
            hashes.insert(user.username, user.password_hash);
        }

        Ok(Self { hashes })
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    /// Unknown usernames still pay for one argon2 verification.
    pub fn verify(&self, credentials: &Credentials) -> bool {
        let (stored, known) = match self.hashes.get(&credentials.username) {
            Some(hash) => (hash.as_str(), true),
            None => (DUMMY_HASH, false),
        };

        let Ok(parsed) = PasswordHash::new(stored) else {
            return false;
        };
        let matches = Argon2::default()
            .verify_password(credentials.password.as_bytes(), &parsed)
            .is_ok();

        known && matches
    }
}
