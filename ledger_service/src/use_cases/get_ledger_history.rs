use crate::domain::entities::{LedgerEntry, OwnerType};
use crate::domain::error::LedgerError;
use crate::domain::repository::{LedgerRepository, WalletRepository};
use crate::domain::types::AssetTypeId;
use std::sync::Arc;

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

/// Caso de uso de lectura: historial de ledger de una billetera de usuario,
/// paginado, lo más reciente primero.
#[derive(Clone)]
pub struct GetLedgerHistoryUseCase {
    wallet_repo: Arc<dyn WalletRepository>,
    ledger_repo: Arc<dyn LedgerRepository>,
}

impl GetLedgerHistoryUseCase {
    pub fn new(
        wallet_repo: Arc<dyn WalletRepository>,
        ledger_repo: Arc<dyn LedgerRepository>,
    ) -> Self {
        Self {
            wallet_repo,
            ledger_repo,
        }
    }

    pub async fn execute(
        &self,
        user_id: &str,
        asset_type_id: AssetTypeId,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        let wallet = self
            .wallet_repo
            .find_by_owner(user_id, OwnerType::USER, asset_type_id)
            .await?;

        let Some(wallet) = wallet else {
            // Usuario sin billetera para el activo: historial vacío.
            return Ok(Vec::new());
        };

        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = offset.unwrap_or(0).max(0);

        self.ledger_repo
            .find_entries_by_wallet(wallet.id, limit, offset)
            .await
    }
}
