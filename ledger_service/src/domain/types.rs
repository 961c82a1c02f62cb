use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::error::LedgerError;

/// Identificador de Billetera usando NewType Pattern.
///
/// Su representación textual canónica (UUID en hexadecimal minúsculo con
/// guiones) define el orden total usado para adquirir locks distribuidos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct WalletId(pub Uuid);

impl WalletId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identificador de Tipo de Activo usando NewType Pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct AssetTypeId(pub Uuid);

impl AssetTypeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for AssetTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identificador de Transacción usando NewType Pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct TransactionId(pub Uuid);

impl TransactionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identificador de Entrada de Ledger usando NewType Pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct LedgerEntryId(pub Uuid);

impl LedgerEntryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for LedgerEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parsea un monto decimal en formato `^\d+(\.\d{1,8})?$`.
///
/// El parseo es explícito (sin regex): parte entera de dígitos, fracción
/// opcional de 1 a 8 dígitos, acotada a la precisión DECIMAL(19,8) del esquema.
///
/// # Examples
/// ```
/// use ledger_service::domain::types::parse_amount;
///
/// assert!(parse_amount("100.50").is_ok());
/// assert!(parse_amount("-5").is_err());
/// assert!(parse_amount("1.123456789").is_err());
/// ```
pub fn parse_amount(raw: &str) -> Result<Decimal, LedgerError> {
    let (integer, fraction) = match raw.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (raw, None),
    };

    if integer.is_empty() || !integer.bytes().all(|b| b.is_ascii_digit()) {
        return Err(LedgerError::InvalidAmount(raw.to_string()));
    }

    if let Some(f) = fraction {
        if f.is_empty() || f.len() > 8 || !f.bytes().all(|b| b.is_ascii_digit()) {
            return Err(LedgerError::InvalidAmount(raw.to_string()));
        }
    }

    Decimal::from_str(raw).map_err(|_| LedgerError::InvalidAmount(raw.to_string()))
}
