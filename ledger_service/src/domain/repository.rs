use crate::domain::entities::{
    AssetType, LedgerEntry, LedgerOperation, OwnerType, TransactionResult, TransactionType, Wallet,
};
use crate::domain::error::LedgerError;
use crate::domain::types::{AssetTypeId, TransactionId, WalletId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

// Port for AssetType lookups
#[async_trait]
pub trait AssetTypeRepository: Send + Sync {
    async fn find_by_id(&self, id: AssetTypeId) -> Result<Option<AssetType>, LedgerError>;
}

// Port for Wallet persistence
#[async_trait]
pub trait WalletRepository: Send + Sync {
    async fn find_by_id(&self, id: WalletId) -> Result<Option<Wallet>, LedgerError>;

    async fn find_by_owner(
        &self,
        owner_id: &str,
        owner_type: OwnerType,
        asset_type_id: AssetTypeId,
    ) -> Result<Option<Wallet>, LedgerError>;

    async fn list_by_owner(
        &self,
        owner_id: &str,
        owner_type: OwnerType,
    ) -> Result<Vec<Wallet>, LedgerError>;

    /// Crea la billetera si no existe; resuelve carreras contra el índice
    /// único `(owner_id, owner_type, asset_type_id)`.
    async fn find_or_create(
        &self,
        owner_id: &str,
        owner_type: OwnerType,
        asset_type_id: AssetTypeId,
    ) -> Result<Wallet, LedgerError>;
}

/// Estadísticas agregadas de una billetera sobre su historial de ledger.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletStats {
    pub wallet_id: WalletId,
    pub balance: Decimal,
    pub version: i64,
    pub total_credits: Decimal,
    pub total_debits: Decimal,
    pub entry_count: i64,
    pub last_entry_at: Option<DateTime<Utc>>,
}

// Port for the double-entry writer and ledger queries
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Escritor de doble partida: dentro de una transacción serializable
    /// inserta la cabecera, valida saldos, escribe las dos entradas y hace
    /// los updates compare-and-swap de balance+versión. Todo o nada.
    async fn record_double_entry(
        &self,
        transaction_id: TransactionId,
        transaction_type: TransactionType,
        idempotency_key: &str,
        operation: &LedgerOperation,
    ) -> Result<TransactionResult, LedgerError>;

    /// Reconstruye el resultado de una transacción COMPLETED ya persistida,
    /// para replays que escapan al cache de idempotencia.
    async fn find_result_by_idempotency_key(
        &self,
        idempotency_key: &str,
    ) -> Result<Option<TransactionResult>, LedgerError>;

    /// Historial de entradas de una billetera, lo más reciente primero.
    async fn find_entries_by_wallet(
        &self,
        wallet_id: WalletId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LedgerEntry>, LedgerError>;

    async fn wallet_stats(&self, wallet_id: WalletId) -> Result<WalletStats, LedgerError>;
}
