use crate::domain::entities::{OwnerType, Wallet};
use crate::domain::error::LedgerError;
use crate::domain::repository::WalletRepository;
use crate::domain::types::{AssetTypeId, WalletId};
use crate::infrastructure::persistence::models::WalletModel;
use async_trait::async_trait;
use sqlx::PgPool;

/// Repositorio de Billeteras basado en PostgreSQL.
pub struct PostgresWalletRepository {
    pool: PgPool,
}

impl PostgresWalletRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WalletRepository for PostgresWalletRepository {
    /// Busca una billetera por su ID.
    async fn find_by_id(&self, id: WalletId) -> Result<Option<Wallet>, LedgerError> {
        let model_opt = sqlx::query_as::<_, WalletModel>(
            r#"
            SELECT * FROM wallets
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| LedgerError::RepositoryError(e.to_string()))?;

        Ok(model_opt.map(|m| m.into()))
    }

    /// Busca la billetera de un dueño para un activo (índice único).
    async fn find_by_owner(
        &self,
        owner_id: &str,
        owner_type: OwnerType,
        asset_type_id: AssetTypeId,
    ) -> Result<Option<Wallet>, LedgerError> {
        let model_opt = sqlx::query_as::<_, WalletModel>(
            r#"
            SELECT * FROM wallets
            WHERE owner_id = $1 AND owner_type = $2 AND asset_type_id = $3
            "#,
        )
        .bind(owner_id)
        .bind(owner_type)
        .bind(asset_type_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| LedgerError::RepositoryError(e.to_string()))?;

        Ok(model_opt.map(|m| m.into()))
    }

    /// Todas las billeteras de un dueño, una por activo.
    async fn list_by_owner(
        &self,
        owner_id: &str,
        owner_type: OwnerType,
    ) -> Result<Vec<Wallet>, LedgerError> {
        let models = sqlx::query_as::<_, WalletModel>(
            r#"
            SELECT * FROM wallets
            WHERE owner_id = $1 AND owner_type = $2
            ORDER BY created_at ASC
            "#,
        )
        .bind(owner_id)
        .bind(owner_type)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LedgerError::RepositoryError(e.to_string()))?;

        Ok(models.into_iter().map(|m| m.into()).collect())
    }

    /// Crea la billetera en el primer uso. `ON CONFLICT DO NOTHING` deja que
    /// el índice único resuelva la carrera entre creadores concurrentes; el
    /// perdedor relee la fila ganadora.
    async fn find_or_create(
        &self,
        owner_id: &str,
        owner_type: OwnerType,
        asset_type_id: AssetTypeId,
    ) -> Result<Wallet, LedgerError> {
        if let Some(existing) = self.find_by_owner(owner_id, owner_type, asset_type_id).await? {
            return Ok(existing);
        }

        let inserted = sqlx::query_as::<_, WalletModel>(
            r#"
            INSERT INTO wallets (id, owner_id, owner_type, asset_type_id, balance, version)
            VALUES ($1, $2, $3, $4, 0, 0)
            ON CONFLICT (owner_id, owner_type, asset_type_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(WalletId::new())
        .bind(owner_id)
        .bind(owner_type)
        .bind(asset_type_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| LedgerError::RepositoryError(e.to_string()))?;

        match inserted {
            Some(model) => Ok(model.into()),
            // Otro proceso ganó la inserción entre nuestro SELECT y el INSERT.
            None => self
                .find_by_owner(owner_id, owner_type, asset_type_id)
                .await?
                .ok_or_else(|| {
                    LedgerError::RepositoryError(format!(
                        "Wallet for {} vanished after conflicting insert",
                        owner_id
                    ))
                }),
        }
    }
}
