use crate::domain::entities::TransactionResult;
use crate::domain::error::LedgerError;
use crate::domain::gateways::IdempotencyStore;
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::time::Duration;

/// Store de idempotencia sobre Redis.
///
/// Es un cache advisory del registro durable en `transactions`: puede
/// perderse sin comprometer la correctitud, el índice único sobre
/// `idempotency_key` sigue siendo la guarda canónica.
#[derive(Clone)]
pub struct RedisIdempotencyStore {
    conn: MultiplexedConnection,
}

impl RedisIdempotencyStore {
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }

    fn result_key(key: &str) -> String {
        format!("idempotency:{}", key)
    }

    fn claim_key(key: &str) -> String {
        format!("processing:{}", key)
    }
}

#[async_trait]
impl IdempotencyStore for RedisIdempotencyStore {
    async fn check(&self, key: &str) -> Result<Option<TransactionResult>, LedgerError> {
        let mut conn = self.conn.clone();

        let raw: Option<String> = conn
            .get(Self::result_key(key))
            .await
            .map_err(|e| LedgerError::IdempotencyStoreError(e.to_string()))?;

        match raw {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| LedgerError::IdempotencyStoreError(e.to_string())),
            None => Ok(None),
        }
    }

    async fn store(
        &self,
        key: &str,
        result: &TransactionResult,
        ttl: Duration,
    ) -> Result<(), LedgerError> {
        let mut conn = self.conn.clone();

        let json = serde_json::to_string(result)
            .map_err(|e| LedgerError::IdempotencyStoreError(e.to_string()))?;

        conn.set_ex::<_, _, ()>(Self::result_key(key), json, ttl.as_secs())
            .await
            .map_err(|e| LedgerError::IdempotencyStoreError(e.to_string()))?;

        Ok(())
    }

    async fn claim(&self, key: &str, ttl: Duration) -> Result<bool, LedgerError> {
        let mut conn = self.conn.clone();

        let reply: Option<String> = redis::cmd("SET")
            .arg(Self::claim_key(key))
            .arg("1")
            .arg("NX")
            .arg("EX")
            .arg(ttl.as_secs())
            .query_async(&mut conn)
            .await
            .map_err(|e| LedgerError::IdempotencyStoreError(e.to_string()))?;

        Ok(reply.is_some())
    }

    async fn unclaim(&self, key: &str) -> Result<(), LedgerError> {
        let mut conn = self.conn.clone();

        let _deleted: u64 = conn
            .del(Self::claim_key(key))
            .await
            .map_err(|e| LedgerError::IdempotencyStoreError(e.to_string()))?;

        Ok(())
    }
}
