use crate::domain::entities::AssetType;
use crate::domain::error::LedgerError;
use crate::domain::repository::AssetTypeRepository;
use crate::domain::types::AssetTypeId;
use crate::infrastructure::persistence::models::AssetTypeModel;
use async_trait::async_trait;
use sqlx::PgPool;

/// Repositorio de Tipos de Activo basado en PostgreSQL. Solo lectura: los
/// activos se siembran una vez y el motor nunca los muta.
pub struct PostgresAssetTypeRepository {
    pool: PgPool,
}

impl PostgresAssetTypeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssetTypeRepository for PostgresAssetTypeRepository {
    async fn find_by_id(&self, id: AssetTypeId) -> Result<Option<AssetType>, LedgerError> {
        let model_opt = sqlx::query_as::<_, AssetTypeModel>(
            r#"
            SELECT * FROM asset_types
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| LedgerError::RepositoryError(e.to_string()))?;

        Ok(model_opt.map(|m| m.into()))
    }
}
