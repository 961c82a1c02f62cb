use crate::domain::entities::{OwnerType, Wallet};
use crate::domain::error::LedgerError;
use crate::domain::repository::WalletRepository;
use crate::domain::types::AssetTypeId;
use std::sync::Arc;

/// Caso de uso de lectura: saldos de un usuario.
///
/// Consulta directa sobre las filas de `wallets`; no entra al motor.
#[derive(Clone)]
pub struct GetBalanceUseCase {
    wallet_repo: Arc<dyn WalletRepository>,
}

impl GetBalanceUseCase {
    pub fn new(wallet_repo: Arc<dyn WalletRepository>) -> Self {
        Self { wallet_repo }
    }

    /// Con `asset_type_id` retorna esa billetera (si existe); sin él, todas
    /// las billeteras del usuario.
    pub async fn execute(
        &self,
        user_id: &str,
        asset_type_id: Option<AssetTypeId>,
    ) -> Result<Vec<Wallet>, LedgerError> {
        match asset_type_id {
            Some(asset) => {
                let wallet = self
                    .wallet_repo
                    .find_by_owner(user_id, OwnerType::USER, asset)
                    .await?;
                Ok(wallet.into_iter().collect())
            }
            None => {
                self.wallet_repo
                    .list_by_owner(user_id, OwnerType::USER)
                    .await
            }
        }
    }
}
