use crate::domain::entities::OwnerType;
use crate::domain::error::LedgerError;
use crate::domain::repository::{LedgerRepository, WalletRepository, WalletStats};
use crate::domain::types::AssetTypeId;
use std::sync::Arc;

/// Caso de uso de lectura: estadísticas agregadas de una billetera de usuario.
#[derive(Clone)]
pub struct GetWalletStatsUseCase {
    wallet_repo: Arc<dyn WalletRepository>,
    ledger_repo: Arc<dyn LedgerRepository>,
}

impl GetWalletStatsUseCase {
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
    ) -> Result<WalletStats, LedgerError> {
        let wallet = self
            .wallet_repo
            .find_by_owner(user_id, OwnerType::USER, asset_type_id)
            .await?
            .ok_or_else(|| {
                LedgerError::WalletNotFound(format!("{}/{}", user_id, asset_type_id))
            })?;

        self.ledger_repo.wallet_stats(wallet.id).await
    }
}
