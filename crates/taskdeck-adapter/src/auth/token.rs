/*
[INPUT]:  Bearer tokens from the external login flow, optional expiry
[OUTPUT]: Token retrieval and expiration status
[POS]:    Auth layer - token lifecycle management
[UPDATE]: When adding token refresh or changing storage strategy
*/

use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, PoisonError, RwLock};

use crate::types::UserId;

/// Stored token data with metadata
#[derive(Debug, Clone)]
pub struct TokenData {
    pub token: String,
    pub user_id: Option<UserId>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Thread-safe bearer token store shared between clients
#[derive(Debug, Clone, Default)]
pub struct TokenStore {
    data: Arc<RwLock<Option<TokenData>>>,
}

impl TokenStore {
    /// Create a new empty token store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a token that never expires locally
    pub fn set_token(&self, token: impl Into<String>, user_id: Option<UserId>) {
        self.store(TokenData {
            token: token.into(),
            user_id,
            expires_at: None,
        });
    }

    /// Store a token with a known lifetime
    pub fn set_token_with_expiry(
        &self,
        token: impl Into<String>,
        user_id: Option<UserId>,
        expires_seconds: u64,
    ) {
        let expires_at = Utc::now() + Duration::seconds(expires_seconds as i64);
        self.store(TokenData {
            token: token.into(),
            user_id,
            expires_at: Some(expires_at),
        });
    }

    fn store(&self, data: TokenData) {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(data);
    }

    /// Get the current token if one is stored, blank tokens count as absent
    pub fn get_token(&self) -> Option<String> {
        let guard = self.data.read().unwrap_or_else(PoisonError::into_inner);
        guard
            .as_ref()
            .map(|data| data.token.clone())
            .filter(|token| !token.trim().is_empty())
    }

    /// Check if the stored token is past its expiry
    pub fn is_expired(&self) -> bool {
        let guard = self.data.read().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref().and_then(|data| data.expires_at) {
            Some(expires_at) => Utc::now() > expires_at,
            None => false,
        }
    }

    /// User the token was issued for, if known
    pub fn user_id(&self) -> Option<UserId> {
        let guard = self.data.read().unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().and_then(|data| data.user_id.clone())
    }

    /// Get token data if available
    pub fn token_data(&self) -> Option<TokenData> {
        let guard = self.data.read().unwrap_or_else(PoisonError::into_inner);
        guard.clone()
    }

    /// Clear the stored token
    pub fn clear(&self) {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntityId;

    #[test]
    fn test_new_store_is_empty() {
        let store = TokenStore::new();
        assert!(store.get_token().is_none());
        assert!(!store.is_expired());
    }

    #[test]
    fn test_set_and_get_token() {
        let store = TokenStore::new();
        store.set_token("test_token", Some(EntityId::Number(4)));

        assert_eq!(store.get_token(), Some("test_token".to_string()));
        assert_eq!(store.user_id(), Some(EntityId::Number(4)));
        assert!(!store.is_expired());
    }

    #[test]
    fn test_blank_token_is_absent() {
        let store = TokenStore::new();
        store.set_token("   ", None);
        assert!(store.get_token().is_none());
    }

    #[test]
    fn test_expiry() {
        let store = TokenStore::new();
        store.set_token_with_expiry("short", None, 0);
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(store.is_expired());

        store.set_token_with_expiry("long", None, 3600);
        assert!(!store.is_expired());
    }

    #[test]
    fn test_clear_token() {
        let store = TokenStore::new();
        store.set_token("test_token", None);

        let shared = store.clone();
        shared.clear();
        assert!(store.get_token().is_none());
        assert!(store.token_data().is_none());
    }
}
