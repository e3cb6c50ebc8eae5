//! Bearer-token authentication against the configured token list.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::application::attachments::Principal;
use crate::config::ApiToken;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("malformed authorization header")]
    Malformed,
    #[error("unknown token")]
    Invalid,
}

struct TokenEntry {
    username: String,
    hashed: Vec<u8>,
}

pub struct TokenAuthenticator {
    entries: Vec<TokenEntry>,
}

impl TokenAuthenticator {
    pub fn new(tokens: &[ApiToken]) -> Self {
        let entries = tokens
            .iter()
            .map(|token| TokenEntry {
                username: token.username.clone(),
                hashed: hash_secret(&token.token),
            })
            .collect();
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve an `Authorization` header value. `None` is an anonymous request.
    pub fn principal(&self, header: Option<&str>) -> Result<Principal, AuthError> {
        let Some(raw) = header else {
            return Ok(Principal::Anonymous);
        };
        let token = raw
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::Malformed)?;
        self.authenticate(token)
    }

    pub fn authenticate(&self, token: &str) -> Result<Principal, AuthError> {
        let hashed = hash_secret(token);
        // Every entry is compared so timing does not reveal the match position.
        let mut matched: Option<&TokenEntry> = None;
        for entry in &self.entries {
            if bool::from(entry.hashed.ct_eq(&hashed)) {
                matched = Some(entry);
            }
        }
        matched
            .map(|entry| Principal::user(entry.username.clone()))
            .ok_or(AuthError::Invalid)
    }
}

fn hash_secret(secret: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.finalize().to_vec()
}
