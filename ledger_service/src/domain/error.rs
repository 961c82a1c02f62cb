use crate::domain::types::{AssetTypeId, WalletId};
use thiserror::Error;

/// Taxonomía cerrada de errores del motor de transacciones.
///
/// Los errores de dominio (saldo, billeteras, conflictos de versión) se
/// cachean bajo la clave de idempotencia; los de infraestructura nunca,
/// para no envenenar reintentos de operaciones sanas.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Insufficient balance in wallet: {0}")]
    InsufficientBalance(WalletId),

    #[error("Source wallet not found with ID: {0}")]
    SourceWalletNotFound(WalletId),

    #[error("Destination wallet not found with ID: {0}")]
    DestinationWalletNotFound(WalletId),

    #[error("Wallet not found: {0}")]
    WalletNotFound(String),

    #[error("Asset type not found or inactive: {0}")]
    AssetTypeNotFound(AssetTypeId),

    #[error("Concurrent modification of source wallet: {0}")]
    ConcurrentModificationSource(WalletId),

    #[error("Concurrent modification of destination wallet: {0}")]
    ConcurrentModificationDestination(WalletId),

    #[error("Could not acquire wallet locks within the retry budget")]
    LockUnavailable,

    #[error("Request already processing for idempotency key: {0}")]
    RequestAlreadyProcessing(String),

    #[error("Idempotency key is required")]
    IdempotencyKeyRequired,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Source and destination wallet must differ: {0}")]
    SameWallet(WalletId),

    #[error("Repository error: {0}")]
    RepositoryError(String),

    #[error("Lock store error: {0}")]
    LockStoreError(String),

    #[error("Idempotency store error: {0}")]
    IdempotencyStoreError(String),
}

impl LedgerError {
    /// Indica si el error es un fallo de dominio cacheable.
    ///
    /// `LockUnavailable` y `RequestAlreadyProcessing` quedan fuera: el caller
    /// puede reintentar con la misma clave y debe poder re-entrar.
    pub fn is_domain(&self) -> bool {
        matches!(
            self,
            LedgerError::InsufficientBalance(_)
                | LedgerError::SourceWalletNotFound(_)
                | LedgerError::DestinationWalletNotFound(_)
                | LedgerError::WalletNotFound(_)
                | LedgerError::AssetTypeNotFound(_)
                | LedgerError::ConcurrentModificationSource(_)
                | LedgerError::ConcurrentModificationDestination(_)
                | LedgerError::InvalidAmount(_)
                | LedgerError::SameWallet(_)
        )
    }
}
