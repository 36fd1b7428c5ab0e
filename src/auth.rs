//! Identity verification.
//!
//! Handlers never see raw tokens. A [`TokenVerifier`] turns a bearer token into
//! a [`VerifiedIdentity`], which the auth extractor then maps to a user row.

use std::collections::HashMap;

use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub subject: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Returns `None` when the token is unknown, expired or malformed.
    async fn verify(&self, token: &str) -> Option<VerifiedIdentity>;
}

/// Verifier backed by a fixed token table loaded from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, VerifiedIdentity>,
}

impl StaticTokenVerifier {
    pub fn new(tokens: impl IntoIterator<Item = (String, VerifiedIdentity)>) -> Self {
        Self {
            tokens: tokens.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl TokenVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Option<VerifiedIdentity> {
        self.tokens.get(token).cloned()
    }
}
