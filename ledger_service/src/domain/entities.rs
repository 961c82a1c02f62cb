use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::error::LedgerError;
use crate::domain::types::{AssetTypeId, LedgerEntryId, TransactionId, WalletId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "owner_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OwnerType {
    USER,
    SYSTEM,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "entry_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryType {
    DEBIT,
    CREDIT,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    TOPUP,
    BONUS,
    PURCHASE,
    // Reservado en el esquema; ninguna operación lo construye todavía.
    TRANSFER,
}

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    PENDING,
    COMPLETED,
    FAILED,
    ROLLED_BACK,
}

/// Modelo de Entidad: AssetType.
/// Una clase de moneda o puntos (oro, diamantes, puntos de lealtad).
/// Se siembra una vez y es efectivamente inmutable para el motor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetType {
    pub id: AssetTypeId,
    pub code: String, // Unique
    pub name: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Modelo de Entidad: Wallet.
/// El registro de saldo por `(owner, asset)`, con versión para optimistic locking.
/// Solo el escritor de doble partida la muta; nunca se borra.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    pub id: WalletId,
    pub owner_id: String,
    pub owner_type: OwnerType,
    pub asset_type_id: AssetTypeId,
    pub balance: Decimal,
    pub version: i64, // Optimistic Locking
    pub created_at: DateTime<Utc>,
}

/// Modelo de Entidad: LedgerEntry.
/// Registro inmutable DEBIT/CREDIT con snapshot del saldo resultante.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
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

/// Modelo de Entidad: Transaction (cabecera).
/// Ancla exactamente dos entradas de ledger vía `transaction_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub idempotency_key: String, // Unique
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Operación de ledger validada: el insumo del escritor de doble partida.
///
/// `from_wallet_id` es opcional para dejar modelado el caso de acuñación pura,
/// aunque este sistema siempre usa billeteras de sistema reales como contraparte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerOperation {
    pub from_wallet_id: Option<WalletId>,
    pub to_wallet_id: WalletId,
    pub asset_type_id: AssetTypeId,
    pub amount: Decimal,
    pub description: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

impl LedgerOperation {
    /// Construye una operación válida: monto estrictamente positivo y
    /// billeteras origen/destino distintas.
    pub fn new(
        from_wallet_id: Option<WalletId>,
        to_wallet_id: WalletId,
        asset_type_id: AssetTypeId,
        amount: Decimal,
        description: Option<String>,
        metadata: Option<serde_json::Value>,
    ) -> Result<Self, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(amount.to_string()));
        }

        if from_wallet_id == Some(to_wallet_id) {
            return Err(LedgerError::SameWallet(to_wallet_id));
        }

        Ok(Self {
            from_wallet_id,
            to_wallet_id,
            asset_type_id,
            amount,
            description,
            metadata,
        })
    }

    /// Billeteras afectadas por la operación (1 o 2 entradas).
    pub fn wallet_ids(&self) -> Vec<WalletId> {
        let mut ids = Vec::with_capacity(2);
        if let Some(from) = self.from_wallet_id {
            ids.push(from);
        }
        ids.push(self.to_wallet_id);
        ids
    }
}

/// Resultado del ejecutor, serializable tal cual hacia el caller y hacia el
/// cache de idempotencia. Los decimales viajan como strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResult {
    pub transaction_id: TransactionId,
    pub status: TransactionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_balance: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_balance: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TransactionResult {
    pub fn completed(
        transaction_id: TransactionId,
        from_balance: Option<Decimal>,
        to_balance: Decimal,
    ) -> Self {
        Self {
            transaction_id,
            status: TransactionStatus::COMPLETED,
            // normalize() descarta ceros de cola que agrega DECIMAL(19,8).
            from_balance: from_balance.map(|b| b.normalize()),
            to_balance: Some(to_balance.normalize()),
            error: None,
        }
    }

    pub fn failed(transaction_id: TransactionId, error: &LedgerError) -> Self {
        Self {
            transaction_id,
            status: TransactionStatus::FAILED,
            from_balance: None,
            to_balance: None,
            error: Some(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn test_ledger_operation_rejects_non_positive_amount() {
        let to = WalletId::new();
        let asset = AssetTypeId::new();

        let zero = LedgerOperation::new(None, to, asset, Decimal::ZERO, None, None);
        assert!(matches!(zero, Err(LedgerError::InvalidAmount(_))));

        let negative = LedgerOperation::new(None, to, asset, Decimal::from(-5), None, None);
        assert!(matches!(negative, Err(LedgerError::InvalidAmount(_))));
    }

    #[test]
    fn test_ledger_operation_rejects_same_wallet() {
        let wallet = WalletId::new();
        let asset = AssetTypeId::new();

        let result =
            LedgerOperation::new(Some(wallet), wallet, asset, Decimal::from(10), None, None);
        assert_eq!(result, Err(LedgerError::SameWallet(wallet)));
    }

    #[test]
    fn test_wallet_ids_keeps_source_then_destination() {
        let from = WalletId::new();
        let to = WalletId::new();
        let asset = AssetTypeId::new();

        let op =
            LedgerOperation::new(Some(from), to, asset, Decimal::from(1), None, None).unwrap();
        assert_eq!(op.wallet_ids(), vec![from, to]);

        let mint = LedgerOperation::new(None, to, asset, Decimal::from(1), None, None).unwrap();
        assert_eq!(mint.wallet_ids(), vec![to]);
    }

    #[test]
    fn test_transaction_result_serializes_decimal_strings() {
        let result = TransactionResult::completed(
            TransactionId::new(),
            Some(Decimal::from_str("9999900.00000000").unwrap()),
            Decimal::from_str("10100.00000000").unwrap(),
        );

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "COMPLETED");
        assert_eq!(json["fromBalance"], "9999900");
        assert_eq!(json["toBalance"], "10100");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_transaction_result_round_trips_through_json() {
        let original = TransactionResult::completed(
            TransactionId::new(),
            None,
            Decimal::from_str("50").unwrap(),
        );

        let json = serde_json::to_string(&original).unwrap();
        let restored: TransactionResult = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, original);
        assert!(restored.from_balance.is_none());
    }
}
