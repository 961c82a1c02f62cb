use crate::domain::entities::{
    EntryType, LedgerEntry, LedgerOperation, TransactionResult, TransactionStatus, TransactionType,
};
use crate::domain::error::LedgerError;
use crate::domain::repository::{LedgerRepository, WalletStats};
use crate::domain::types::{LedgerEntryId, TransactionId, WalletId};
use crate::infrastructure::persistence::models::{
    LedgerEntryModel, TransactionModel, WalletModel, WalletStatsModel,
};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

/// Repositorio del ledger basado en PostgreSQL: el escritor de doble partida
/// y las consultas de historial.
///
/// El escritor corre en una transacción con aislamiento SERIALIZABLE y
/// timeouts locales acotados (espera de locks 5s, statement 10s), bien por
/// debajo del TTL de 30s de los locks distribuidos. La defensa es en
/// profundidad: lock distribuido, aislamiento serializable y CAS de versión
/// se conservan los tres.
pub struct PostgresLedgerRepository {
    pool: PgPool,
}

impl PostgresLedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_wallet(
        tx: &mut Transaction<'_, Postgres>,
        id: WalletId,
    ) -> Result<Option<WalletModel>, LedgerError> {
        sqlx::query_as::<_, WalletModel>(r#"SELECT * FROM wallets WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| LedgerError::RepositoryError(e.to_string()))
    }

    #[allow(clippy::too_many_arguments)]
    async fn insert_entry(
        tx: &mut Transaction<'_, Postgres>,
        transaction_id: TransactionId,
        wallet_id: WalletId,
        operation: &LedgerOperation,
        entry_type: EntryType,
        running_balance: Decimal,
        counterparty_wallet_id: Option<WalletId>,
        created_at: chrono::DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        sqlx::query(
            r#"
            INSERT INTO ledger_entries (
                id, transaction_id, wallet_id, asset_type_id, entry_type,
                amount, running_balance, counterparty_wallet_id, description, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(LedgerEntryId::new())
        .bind(transaction_id)
        .bind(wallet_id)
        .bind(operation.asset_type_id)
        .bind(entry_type)
        .bind(operation.amount)
        .bind(running_balance)
        .bind(counterparty_wallet_id)
        .bind(operation.description.as_deref())
        .bind(created_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| LedgerError::RepositoryError(e.to_string()))?;

        Ok(())
    }

    /// Update compare-and-swap: solo escribe si la versión leída sigue vigente.
    async fn cas_update_wallet(
        tx: &mut Transaction<'_, Postgres>,
        wallet: &WalletModel,
        new_balance: Decimal,
    ) -> Result<bool, LedgerError> {
        let result = sqlx::query(
            r#"
            UPDATE wallets
            SET balance = $1, version = version + 1
            WHERE id = $2 AND version = $3
            "#,
        )
        .bind(new_balance)
        .bind(wallet.id)
        .bind(wallet.version)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            // Backstop: el CHECK de saldo no-negativo no debería dispararse,
            // el saldo ya se validó con la fila leída en esta transacción.
            if e.to_string().contains("wallets_balance_positive_chk") {
                return LedgerError::InsufficientBalance(wallet.id);
            }
            LedgerError::RepositoryError(e.to_string())
        })?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl LedgerRepository for PostgresLedgerRepository {
    /// Escritor de doble partida.
    ///
    /// Dentro de una única transacción serializable: inserta la cabecera
    /// (el índice único de `idempotency_key` es la guarda durable contra la
    /// doble ejecución), lee y valida ambas billeteras, escribe el crédito y
    /// luego el débito con el mismo timestamp, y cierra con los dos updates
    /// CAS. Cualquier fallo aborta la transacción completa: cabecera y
    /// entradas se esfuman juntas.
    async fn record_double_entry(
        &self,
        transaction_id: TransactionId,
        transaction_type: TransactionType,
        idempotency_key: &str,
        operation: &LedgerOperation,
    ) -> Result<TransactionResult, LedgerError> {
        // Validado río arriba; se re-chequea aquí por contrato.
        if operation.amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(operation.amount.to_string()));
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| LedgerError::RepositoryError(e.to_string()))?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await
            .map_err(|e| LedgerError::RepositoryError(e.to_string()))?;
        sqlx::query("SET LOCAL lock_timeout = '5s'")
            .execute(&mut *tx)
            .await
            .map_err(|e| LedgerError::RepositoryError(e.to_string()))?;
        sqlx::query("SET LOCAL statement_timeout = '10s'")
            .execute(&mut *tx)
            .await
            .map_err(|e| LedgerError::RepositoryError(e.to_string()))?;

        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, idempotency_key, transaction_type, status, metadata, created_at, completed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(transaction_id)
        .bind(idempotency_key)
        .bind(transaction_type)
        .bind(TransactionStatus::COMPLETED)
        .bind(operation.metadata.as_ref())
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .map_or(false, |d| d.is_unique_violation())
            {
                LedgerError::RequestAlreadyProcessing(idempotency_key.to_string())
            } else {
                LedgerError::RepositoryError(e.to_string())
            }
        })?;

        let to_wallet = Self::fetch_wallet(&mut tx, operation.to_wallet_id)
            .await?
            .ok_or(LedgerError::DestinationWalletNotFound(
                operation.to_wallet_id,
            ))?;

        let from_wallet = match operation.from_wallet_id {
            Some(from_id) => Some(
                Self::fetch_wallet(&mut tx, from_id)
                    .await?
                    .ok_or(LedgerError::SourceWalletNotFound(from_id))?,
            ),
            None => None,
        };

        if let Some(from) = &from_wallet {
            if from.balance < operation.amount {
                return Err(LedgerError::InsufficientBalance(from.id));
            }
        }

        let new_to_balance = to_wallet.balance + operation.amount;
        let new_from_balance = from_wallet.as_ref().map(|w| w.balance - operation.amount);

        // Crédito antes que débito; ambas entradas comparten timestamp.
        Self::insert_entry(
            &mut tx,
            transaction_id,
            to_wallet.id,
            operation,
            EntryType::CREDIT,
            new_to_balance,
            from_wallet.as_ref().map(|w| w.id),
            now,
        )
        .await?;

        if let (Some(from), Some(new_from)) = (&from_wallet, new_from_balance) {
            Self::insert_entry(
                &mut tx,
                transaction_id,
                from.id,
                operation,
                EntryType::DEBIT,
                new_from,
                Some(to_wallet.id),
                now,
            )
            .await?;
        }

        if let (Some(from), Some(new_from)) = (&from_wallet, new_from_balance) {
            if !Self::cas_update_wallet(&mut tx, from, new_from).await? {
                return Err(LedgerError::ConcurrentModificationSource(from.id));
            }
        }

        if !Self::cas_update_wallet(&mut tx, &to_wallet, new_to_balance).await? {
            return Err(LedgerError::ConcurrentModificationDestination(to_wallet.id));
        }

        tx.commit()
            .await
            .map_err(|e| LedgerError::RepositoryError(e.to_string()))?;

        Ok(TransactionResult::completed(
            transaction_id,
            new_from_balance,
            new_to_balance,
        ))
    }

    /// Reconstruye el resultado original desde las filas durables, para
    /// replays cuyo registro en cache expiró. Solo cabeceras COMPLETED.
    async fn find_result_by_idempotency_key(
        &self,
        idempotency_key: &str,
    ) -> Result<Option<TransactionResult>, LedgerError> {
        let header = sqlx::query_as::<_, TransactionModel>(
            r#"SELECT * FROM transactions WHERE idempotency_key = $1"#,
        )
        .bind(idempotency_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| LedgerError::RepositoryError(e.to_string()))?;

        let Some(header) = header else {
            return Ok(None);
        };
        if header.status != TransactionStatus::COMPLETED {
            return Ok(None);
        }

        let entries = sqlx::query_as::<_, LedgerEntryModel>(
            r#"SELECT * FROM ledger_entries WHERE transaction_id = $1"#,
        )
        .bind(header.id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LedgerError::RepositoryError(e.to_string()))?;

        let mut from_balance = None;
        let mut to_balance = None;
        for entry in &entries {
            match entry.entry_type {
                EntryType::CREDIT => to_balance = Some(entry.running_balance),
                EntryType::DEBIT => from_balance = Some(entry.running_balance),
            }
        }

        let Some(to_balance) = to_balance else {
            return Err(LedgerError::RepositoryError(format!(
                "Completed transaction {} has no credit entry",
                header.id
            )));
        };

        Ok(Some(TransactionResult::completed(
            header.id,
            from_balance,
            to_balance,
        )))
    }

    async fn find_entries_by_wallet(
        &self,
        wallet_id: WalletId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        let models = sqlx::query_as::<_, LedgerEntryModel>(
            r#"
            SELECT * FROM ledger_entries
            WHERE wallet_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(wallet_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LedgerError::RepositoryError(e.to_string()))?;

        Ok(models.into_iter().map(|m| m.into()).collect())
    }

    async fn wallet_stats(&self, wallet_id: WalletId) -> Result<WalletStats, LedgerError> {
        let model = sqlx::query_as::<_, WalletStatsModel>(
            r#"
            SELECT w.id AS wallet_id,
                   w.balance,
                   w.version,
                   COALESCE(SUM(e.amount) FILTER (WHERE e.entry_type = 'CREDIT'), 0) AS total_credits,
                   COALESCE(SUM(e.amount) FILTER (WHERE e.entry_type = 'DEBIT'), 0) AS total_debits,
                   COUNT(e.id) AS entry_count,
                   MAX(e.created_at) AS last_entry_at
            FROM wallets w
            LEFT JOIN ledger_entries e ON e.wallet_id = w.id
            WHERE w.id = $1
            GROUP BY w.id, w.balance, w.version
            "#,
        )
        .bind(wallet_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| LedgerError::RepositoryError(e.to_string()))?
        .ok_or_else(|| LedgerError::WalletNotFound(wallet_id.to_string()))?;

        Ok(model.into())
    }
}
