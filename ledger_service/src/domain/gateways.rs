use crate::domain::entities::TransactionResult;
use crate::domain::error::LedgerError;
use async_trait::async_trait;
use std::time::Duration;

// Port for the distributed lock manager (named, expiring, token-owned mutexes)
#[async_trait]
pub trait LockStore: Send + Sync {
    /// Intenta fijar `lock:<name>` a un token fresco solo si está ausente.
    /// Retorna el token en éxito, `None` en contención.
    async fn acquire(&self, name: &str, ttl: Duration) -> Result<Option<String>, LedgerError>;

    /// Borra `lock:<name>` solo si su valor actual es `token`. No-op si el
    /// lock ya expiró y fue re-adquirido por otro dueño.
    async fn release(&self, name: &str, token: &str) -> Result<(), LedgerError>;

    /// Refresca la expiración solo si el valor actual es `token`.
    async fn extend(&self, name: &str, token: &str, ttl: Duration) -> Result<bool, LedgerError>;
}

// Port for the idempotency store (advisory cache over the durable unique index)
#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    /// Retorna el resultado previo si existe (`idempotency:<key>`).
    async fn check(&self, key: &str) -> Result<Option<TransactionResult>, LedgerError>;

    /// Persiste el resultado serializado con el TTL dado.
    async fn store(
        &self,
        key: &str,
        result: &TransactionResult,
        ttl: Duration,
    ) -> Result<(), LedgerError>;

    /// Fija el marcador in-flight `processing:<key>` solo si está ausente.
    /// Retorna `false` si ya estaba reclamado.
    async fn claim(&self, key: &str, ttl: Duration) -> Result<bool, LedgerError>;

    /// Borra el marcador in-flight.
    async fn unclaim(&self, key: &str) -> Result<(), LedgerError>;
}
