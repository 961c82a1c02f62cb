use crate::domain::entities::TransactionResult;
use crate::domain::error::LedgerError;
use crate::domain::gateways::{IdempotencyStore, LockStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Implementación en memoria del lock store, con la misma semántica de
/// token + TTL que la versión Redis. Útil para tests y desarrollo local
/// sin levantar Redis; no sirve entre procesos.
#[derive(Default)]
pub struct InMemoryLockStore {
    locks: Mutex<HashMap<String, (String, Instant)>>,
}

impl InMemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LockStore for InMemoryLockStore {
    async fn acquire(&self, name: &str, ttl: Duration) -> Result<Option<String>, LedgerError> {
        let mut locks = self.locks.lock().await;
        let now = Instant::now();

        if let Some((_, expires_at)) = locks.get(name) {
            if *expires_at > now {
                return Ok(None);
            }
        }

        let token = Uuid::new_v4().to_string();
        locks.insert(name.to_string(), (token.clone(), now + ttl));
        Ok(Some(token))
    }

    async fn release(&self, name: &str, token: &str) -> Result<(), LedgerError> {
        let mut locks = self.locks.lock().await;
        if let Some((held_token, _)) = locks.get(name) {
            if held_token == token {
                locks.remove(name);
            }
        }
        Ok(())
    }

    async fn extend(&self, name: &str, token: &str, ttl: Duration) -> Result<bool, LedgerError> {
        let mut locks = self.locks.lock().await;
        if let Some((held_token, expires_at)) = locks.get_mut(name) {
            if held_token == token {
                *expires_at = Instant::now() + ttl;
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Implementación en memoria del store de idempotencia.
#[derive(Default)]
pub struct InMemoryIdempotencyStore {
    results: Mutex<HashMap<String, (TransactionResult, Instant)>>,
    claims: Mutex<HashMap<String, Instant>>,
}

impl InMemoryIdempotencyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdempotencyStore for InMemoryIdempotencyStore {
    async fn check(&self, key: &str) -> Result<Option<TransactionResult>, LedgerError> {
        let results = self.results.lock().await;
        match results.get(key) {
            Some((result, expires_at)) if *expires_at > Instant::now() => {
                Ok(Some(result.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn store(
        &self,
        key: &str,
        result: &TransactionResult,
        ttl: Duration,
    ) -> Result<(), LedgerError> {
        let mut results = self.results.lock().await;
        results.insert(key.to_string(), (result.clone(), Instant::now() + ttl));
        Ok(())
    }

    async fn claim(&self, key: &str, ttl: Duration) -> Result<bool, LedgerError> {
        let mut claims = self.claims.lock().await;
        let now = Instant::now();

        if let Some(expires_at) = claims.get(key) {
            if *expires_at > now {
                return Ok(false);
            }
        }

        claims.insert(key.to_string(), now + ttl);
        Ok(true)
    }

    async fn unclaim(&self, key: &str) -> Result<(), LedgerError> {
        let mut claims = self.claims.lock().await;
        claims.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lock_is_exclusive_until_released() {
        let store = InMemoryLockStore::new();
        let ttl = Duration::from_secs(30);

        let token = store.acquire("wallet:a", ttl).await.unwrap().unwrap();
        assert!(store.acquire("wallet:a", ttl).await.unwrap().is_none());

        store.release("wallet:a", &token).await.unwrap();
        assert!(store.acquire("wallet:a", ttl).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_release_with_foreign_token_is_a_noop() {
        let store = InMemoryLockStore::new();
        let ttl = Duration::from_secs(30);

        let _token = store.acquire("wallet:a", ttl).await.unwrap().unwrap();
        store.release("wallet:a", "stale-token").await.unwrap();

        // El lock sigue tomado por el dueño original.
        assert!(store.acquire("wallet:a", ttl).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_lock_can_be_reacquired() {
        let store = InMemoryLockStore::new();

        let _token = store
            .acquire("wallet:a", Duration::from_millis(0))
            .await
            .unwrap()
            .unwrap();

        assert!(store
            .acquire("wallet:a", Duration::from_secs(30))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_extend_only_refreshes_own_token() {
        let store = InMemoryLockStore::new();
        let ttl = Duration::from_secs(30);

        let token = store.acquire("wallet:a", ttl).await.unwrap().unwrap();
        assert!(store.extend("wallet:a", &token, ttl).await.unwrap());
        assert!(!store.extend("wallet:a", "stale-token", ttl).await.unwrap());
        assert!(!store.extend("wallet:b", &token, ttl).await.unwrap());
    }

    #[tokio::test]
    async fn test_claim_is_exclusive_and_unclaim_frees_it() {
        let store = InMemoryIdempotencyStore::new();
        let ttl = Duration::from_secs(30);

        assert!(store.claim("k1", ttl).await.unwrap());
        assert!(!store.claim("k1", ttl).await.unwrap());

        store.unclaim("k1").await.unwrap();
        assert!(store.claim("k1", ttl).await.unwrap());
    }
}
