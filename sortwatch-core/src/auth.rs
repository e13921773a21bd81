//! Bearer-token authentication contract.
//!
//! The service only needs "token in, principal or rejection out".
//! [`StaticTokens`] is the table-backed implementation loaded from config.

use dashmap::DashMap;

use crate::config::TokenEntry;
use crate::types::Principal;

/// Resolves a bearer token to the principal it belongs to.
pub trait TokenAuthenticator: Send + Sync {
    fn authenticate(&self, token: &str) -> Option<Principal>;
}

/// Token table using DashMap for lock-free concurrent lookup.
#[derive(Debug, Default)]
pub struct StaticTokens {
    tokens: DashMap<String, Principal>,
}

impl StaticTokens {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: &[TokenEntry]) -> Self {
        let table = Self::new();
        for entry in entries {
            table.insert(entry.token.clone(), entry.principal.clone());
        }
        table
    }

    pub fn insert(&self, token: impl Into<String>, principal: Principal) {
        self.tokens.insert(token.into(), principal);
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl TokenAuthenticator for StaticTokens {
    fn authenticate(&self, token: &str) -> Option<Principal> {
        self.tokens.get(token).map(|entry| entry.value().clone())
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
