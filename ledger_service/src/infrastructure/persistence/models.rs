use crate::domain::entities::{
    AssetType, EntryType, LedgerEntry, OwnerType, Transaction, TransactionStatus, TransactionType,
    Wallet,
};
use crate::domain::types::{AssetTypeId, LedgerEntryId, TransactionId, WalletId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

#[derive(Debug, FromRow)]
pub struct AssetTypeModel {
    pub id: AssetTypeId,
    pub code: String,
    pub name: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<AssetTypeModel> for AssetType {
    fn from(m: AssetTypeModel) -> Self {
        Self {
            id: m.id,
            code: m.code,
            name: m.name,
            active: m.active,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct WalletModel {
    pub id: WalletId,
    pub owner_id: String,
    pub owner_type: OwnerType,
    pub asset_type_id: AssetTypeId,
    pub balance: Decimal,
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

impl From<WalletModel> for Wallet {
    fn from(m: WalletModel) -> Self {
        Self {
            id: m.id,
            owner_id: m.owner_id,
            owner_type: m.owner_type,
            asset_type_id: m.asset_type_id,
            balance: m.balance,
            version: m.version,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct LedgerEntryModel {
    pub id: LedgerEntryId,
    pub transaction_id: TransactionId,
    pub wallet_id: WalletId,
    pub asset_type_id: AssetTypeId,
    pub entry_type: EntryType,
    pub amount: Decimal,
    pub running_balance: Decimal,
    pub counterparty_wallet_id: Option<WalletId>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<LedgerEntryModel> for LedgerEntry {
    fn from(m: LedgerEntryModel) -> Self {
        Self {
            id: m.id,
            transaction_id: m.transaction_id,
            wallet_id: m.wallet_id,
            asset_type_id: m.asset_type_id,
            entry_type: m.entry_type,
            amount: m.amount,
            running_balance: m.running_balance,
            counterparty_wallet_id: m.counterparty_wallet_id,
            description: m.description,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct WalletStatsModel {
    pub wallet_id: WalletId,
    pub balance: Decimal,
    pub version: i64,
    pub total_credits: Decimal,
    pub total_debits: Decimal,
    pub entry_count: i64,
    pub last_entry_at: Option<DateTime<Utc>>,
}

impl From<WalletStatsModel> for crate::domain::repository::WalletStats {
    fn from(m: WalletStatsModel) -> Self {
        Self {
            wallet_id: m.wallet_id,
            balance: m.balance,
            version: m.version,
            total_credits: m.total_credits,
            total_debits: m.total_debits,
            entry_count: m.entry_count,
            last_entry_at: m.last_entry_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct TransactionModel {
    pub id: TransactionId,
    pub idempotency_key: String,
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<TransactionModel> for Transaction {
    fn from(m: TransactionModel) -> Self {
        Self {
            id: m.id,
            idempotency_key: m.idempotency_key,
            transaction_type: m.transaction_type,
            status: m.status,
            metadata: m.metadata,
            created_at: m.created_at,
            completed_at: m.completed_at,
        }
    }
}
