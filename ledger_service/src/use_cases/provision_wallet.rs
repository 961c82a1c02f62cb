use crate::domain::entities::{AssetType, OwnerType, Wallet};
use crate::domain::error::LedgerError;
use crate::domain::repository::{AssetTypeRepository, WalletRepository};
use crate::domain::types::AssetTypeId;
use std::sync::Arc;

/// Dueño de la billetera de sistema que origina los fondos acuñados.
pub const TREASURY_OWNER: &str = "TREASURY";

/// Dueño de la billetera de sistema que origina bonos y recibe compras.
pub const REVENUE_OWNER: &str = "REVENUE";

/// Caso de uso de aprovisionamiento: resuelve las billeteras de una operación
/// *antes* de entrar al ejecutor, que las trata como preexistentes por id.
///
/// La billetera destino del usuario se auto-crea en el primer uso; la carrera
/// contra otra creación concurrente la resuelve el índice único
/// `(owner_id, owner_type, asset_type_id)`.
#[derive(Clone)]
pub struct ProvisionWalletUseCase {
    wallet_repo: Arc<dyn WalletRepository>,
    asset_repo: Arc<dyn AssetTypeRepository>,
}

impl ProvisionWalletUseCase {
    pub fn new(
        wallet_repo: Arc<dyn WalletRepository>,
        asset_repo: Arc<dyn AssetTypeRepository>,
    ) -> Self {
        Self {
            wallet_repo,
            asset_repo,
        }
    }

    /// Valida que el activo exista y esté activo antes de tocar billeteras.
    pub async fn active_asset(&self, asset_type_id: AssetTypeId) -> Result<AssetType, LedgerError> {
        self.asset_repo
            .find_by_id(asset_type_id)
            .await?
            .filter(|asset| asset.active)
            .ok_or(LedgerError::AssetTypeNotFound(asset_type_id))
    }

    /// Billetera del usuario para el activo, creada con saldo 0 si no existe.
    pub async fn user_wallet(
        &self,
        user_id: &str,
        asset_type_id: AssetTypeId,
    ) -> Result<Wallet, LedgerError> {
        self.wallet_repo
            .find_or_create(user_id, OwnerType::USER, asset_type_id)
            .await
    }

    /// Billetera de sistema sembrada (TREASURY o REVENUE) para el activo.
    /// Nunca se auto-crea: su ausencia es un error de despliegue.
    pub async fn system_wallet(
        &self,
        owner_id: &str,
        asset_type_id: AssetTypeId,
    ) -> Result<Wallet, LedgerError> {
        self.wallet_repo
            .find_by_owner(owner_id, OwnerType::SYSTEM, asset_type_id)
            .await?
            .ok_or_else(|| {
                LedgerError::RepositoryError(format!(
                    "Missing seeded system wallet {} for asset {}",
                    owner_id, asset_type_id
                ))
            })
    }
}
