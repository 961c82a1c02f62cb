use crate::domain::error::LedgerError;
use crate::domain::gateways::LockStore;
use async_trait::async_trait;
use chrono::Utc;
use redis::aio::MultiplexedConnection;
use redis::Script;
use std::time::Duration;
use uuid::Uuid;

/// Borra el lock solo si el valor actual es el token del caller. Evita que
/// un dueño lento libere un lock que ya expiró y fue re-adquirido por otro.
const COMPARE_AND_DELETE: &str = r#"
if redis.call('get', KEYS[1]) == ARGV[1] then
    return redis.call('del', KEYS[1])
else
    return 0
end
"#;

/// Refresca la expiración solo si el valor actual es el token del caller.
const COMPARE_AND_EXPIRE: &str = r#"
if redis.call('get', KEYS[1]) == ARGV[1] then
    return redis.call('pexpire', KEYS[1], ARGV[2])
else
    return 0
end
"#;

/// Lock manager distribuido sobre Redis.
///
/// `SET NX PX` con token fresco por adquisición; release y extend van por
/// scripts Lua para que el chequeo de token sea atómico.
#[derive(Clone)]
pub struct RedisLockStore {
    conn: MultiplexedConnection,
}

impl RedisLockStore {
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }

    fn lock_key(name: &str) -> String {
        format!("lock:{}", name)
    }

    /// Token único por adquisición: timestamp + sufijo aleatorio.
    fn fresh_token() -> String {
        format!("{}-{}", Utc::now().timestamp_millis(), Uuid::new_v4())
    }
}

#[async_trait]
impl LockStore for RedisLockStore {
    async fn acquire(&self, name: &str, ttl: Duration) -> Result<Option<String>, LedgerError> {
        let mut conn = self.conn.clone();
        let token = Self::fresh_token();

        let reply: Option<String> = redis::cmd("SET")
            .arg(Self::lock_key(name))
            .arg(&token)
            .arg("NX")
            .arg("PX")
            .arg(ttl.as_millis() as u64)
            .query_async(&mut conn)
            .await
            .map_err(|e| LedgerError::LockStoreError(e.to_string()))?;

        Ok(reply.map(|_| token))
    }

    async fn release(&self, name: &str, token: &str) -> Result<(), LedgerError> {
        let mut conn = self.conn.clone();
        let script = Script::new(COMPARE_AND_DELETE);

        // 0 (token ajeno o lock expirado) también es un release correcto.
        let _deleted: i64 = script
            .key(Self::lock_key(name))
            .arg(token)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| LedgerError::LockStoreError(e.to_string()))?;

        Ok(())
    }

    async fn extend(&self, name: &str, token: &str, ttl: Duration) -> Result<bool, LedgerError> {
        let mut conn = self.conn.clone();
        let script = Script::new(COMPARE_AND_EXPIRE);

        let extended: i64 = script
            .key(Self::lock_key(name))
            .arg(token)
            .arg(ttl.as_millis() as u64)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| LedgerError::LockStoreError(e.to_string()))?;

        Ok(extended == 1)
    }
}
