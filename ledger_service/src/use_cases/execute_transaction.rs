use crate::domain::entities::{LedgerOperation, TransactionResult, TransactionType};
use crate::domain::error::LedgerError;
use crate::domain::gateways::IdempotencyStore;
use crate::domain::repository::LedgerRepository;
use crate::domain::types::TransactionId;
use crate::use_cases::ordered_locks::OrderedLockCoordinator;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// TTL del resultado cacheado de una ejecución exitosa.
const SUCCESS_RESULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// TTL del resultado cacheado de un fallo de dominio. Más corto: el caller
/// puede corregir la causa y reintentar con una clave nueva.
const FAILURE_RESULT_TTL: Duration = Duration::from_secs(60 * 60);

/// TTL del marcador in-flight; acota marcadores huérfanos por crashes.
const CLAIM_TTL: Duration = Duration::from_secs(30);

/// Caso de uso central: el ejecutor de transacciones del ledger.
///
/// Compone el store de idempotencia, el coordinador de locks ordenados y el
/// escritor de doble partida. Por clave de idempotencia:
///
/// 1. `check`: si hay resultado previo, se retorna tal cual.
/// 2. `claim`: si el marcador in-flight ya existe, falla con
///    `RequestAlreadyProcessing`.
/// 3. Bajo los locks de las billeteras afectadas, el repositorio abre una
///    transacción serializable y escribe cabecera + dos entradas + dos
///    updates CAS, atómicamente.
/// 4. El resultado (o el fallo de dominio) se persiste bajo la clave y el
///    marcador se limpia en ambos caminos.
pub struct TransactionExecutor {
    idempotency: Arc<dyn IdempotencyStore>,
    coordinator: OrderedLockCoordinator,
    ledger_repo: Arc<dyn LedgerRepository>,
}

impl TransactionExecutor {
    pub fn new(
        idempotency: Arc<dyn IdempotencyStore>,
        coordinator: OrderedLockCoordinator,
        ledger_repo: Arc<dyn LedgerRepository>,
    ) -> Self {
        Self {
            idempotency,
            coordinator,
            ledger_repo,
        }
    }

    #[tracing::instrument(name = "TransactionExecutor::execute", skip(self, operation))]
    pub async fn execute(
        &self,
        transaction_type: TransactionType,
        operation: LedgerOperation,
        idempotency_key: &str,
    ) -> Result<TransactionResult, LedgerError> {
        // La fachada ya lo exige; se re-chequea por robustez.
        if idempotency_key.trim().is_empty() {
            return Err(LedgerError::IdempotencyKeyRequired);
        }

        // 1. Cache hit: retornamos el resultado previo sin re-ejecutar nada.
        if let Some(previous) = self.idempotency.check(idempotency_key).await? {
            return Ok(previous);
        }

        // 2. Marcador in-flight: exactamente un procesador por clave.
        if !self.idempotency.claim(idempotency_key, CLAIM_TTL).await? {
            return Err(LedgerError::RequestAlreadyProcessing(
                idempotency_key.to_string(),
            ));
        }

        let outcome = self
            .run_locked(transaction_type, &operation, idempotency_key)
            .await;

        // 3. Limpiamos el marcador pase lo que pase; si esto falla, el TTL
        // del claim lo expira solo.
        if let Err(e) = self.idempotency.unclaim(idempotency_key).await {
            warn!(
                "Failed to unclaim idempotency key {}: {}. Claim TTL will expire it.",
                idempotency_key, e
            );
        }

        outcome
    }

    async fn run_locked(
        &self,
        transaction_type: TransactionType,
        operation: &LedgerOperation,
        idempotency_key: &str,
    ) -> Result<TransactionResult, LedgerError> {
        let transaction_id = TransactionId::new();
        let wallet_ids = operation.wallet_ids();

        let repo = Arc::clone(&self.ledger_repo);
        let op = operation.clone();
        let key = idempotency_key.to_string();

        let result = self
            .coordinator
            .with_wallet_locks(&wallet_ids, || async move {
                repo.record_double_entry(transaction_id, transaction_type, &key, &op)
                    .await
            })
            .await;

        match result {
            Ok(result) => {
                self.cache_result(idempotency_key, &result, SUCCESS_RESULT_TTL)
                    .await;
                Ok(result)
            }
            // El índice único sobre idempotency_key rechazó la cabecera: la
            // transacción ya existe en forma durable aunque el cache la haya
            // perdido. Si está COMPLETED, reconstruimos el resultado original.
            Err(LedgerError::RequestAlreadyProcessing(_)) => {
                match self
                    .ledger_repo
                    .find_result_by_idempotency_key(idempotency_key)
                    .await?
                {
                    Some(replayed) => {
                        self.cache_result(idempotency_key, &replayed, SUCCESS_RESULT_TTL)
                            .await;
                        Ok(replayed)
                    }
                    None => Err(LedgerError::RequestAlreadyProcessing(
                        idempotency_key.to_string(),
                    )),
                }
            }
            Err(e) => {
                // Solo los fallos de dominio se cachean; los de infraestructura
                // no deben bloquear reintentos legítimos.
                if e.is_domain() {
                    let failure = TransactionResult::failed(transaction_id, &e);
                    self.cache_result(idempotency_key, &failure, FAILURE_RESULT_TTL)
                        .await;
                }
                Err(e)
            }
        }
    }

    /// El cache es advisory: si el store falla, la fila durable de
    /// `transactions` sigue siendo la guarda canónica contra replays.
    async fn cache_result(&self, key: &str, result: &TransactionResult, ttl: Duration) {
        if let Err(e) = self.idempotency.store(key, result, ttl).await {
            warn!("Failed to store idempotency result for {}: {}", key, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{LedgerEntry, TransactionStatus};
    use crate::domain::gateways::LockStore;
    use crate::domain::repository::WalletStats;
    use crate::domain::types::{AssetTypeId, WalletId};
    use crate::infrastructure::gateways::in_memory::InMemoryLockStore;
    use async_trait::async_trait;
    use mockall::mock;
    use mockall::predicate::*;
    use rust_decimal::Decimal;

    mock! {
        pub IdempotencyStoreImpl {}

        #[async_trait]
        impl IdempotencyStore for IdempotencyStoreImpl {
            async fn check(&self, key: &str) -> Result<Option<TransactionResult>, LedgerError>;
            async fn store(&self, key: &str, result: &TransactionResult, ttl: Duration) -> Result<(), LedgerError>;
            async fn claim(&self, key: &str, ttl: Duration) -> Result<bool, LedgerError>;
            async fn unclaim(&self, key: &str) -> Result<(), LedgerError>;
        }
    }

    mock! {
        pub LedgerRepositoryImpl {}

        #[async_trait]
        impl LedgerRepository for LedgerRepositoryImpl {
            async fn record_double_entry(
                &self,
                transaction_id: TransactionId,
                transaction_type: TransactionType,
                idempotency_key: &str,
                operation: &LedgerOperation,
            ) -> Result<TransactionResult, LedgerError>;
            async fn find_result_by_idempotency_key(
                &self,
                idempotency_key: &str,
            ) -> Result<Option<TransactionResult>, LedgerError>;
            async fn find_entries_by_wallet(
                &self,
                wallet_id: WalletId,
                limit: i64,
                offset: i64,
            ) -> Result<Vec<LedgerEntry>, LedgerError>;
            async fn wallet_stats(&self, wallet_id: WalletId) -> Result<WalletStats, LedgerError>;
        }
    }

    fn executor(
        idempotency: MockIdempotencyStoreImpl,
        repo: MockLedgerRepositoryImpl,
    ) -> TransactionExecutor {
        let lock_store: Arc<dyn LockStore> = Arc::new(InMemoryLockStore::new());
        TransactionExecutor::new(
            Arc::new(idempotency),
            OrderedLockCoordinator::new(lock_store),
            Arc::new(repo),
        )
    }

    fn sample_operation() -> LedgerOperation {
        LedgerOperation::new(
            Some(WalletId::new()),
            WalletId::new(),
            AssetTypeId::new(),
            Decimal::from(100),
            None,
            None,
        )
        .unwrap()
    }

    fn completed_result() -> TransactionResult {
        TransactionResult::completed(
            TransactionId::new(),
            Some(Decimal::from(9_999_900)),
            Decimal::from(10_100),
        )
    }

    #[tokio::test]
    async fn test_cache_hit_returns_stored_result_without_executing() {
        let mut idempotency = MockIdempotencyStoreImpl::new();
        let repo = MockLedgerRepositoryImpl::new(); // sin expectativas: no debe tocarse

        let cached = completed_result();
        let expected = cached.clone();
        idempotency
            .expect_check()
            .with(eq("t1"))
            .times(1)
            .returning(move |_| Ok(Some(cached.clone())));

        let executor = executor(idempotency, repo);
        let result = executor
            .execute(TransactionType::TOPUP, sample_operation(), "t1")
            .await
            .unwrap();

        assert_eq!(result, expected);
    }

    #[tokio::test]
    async fn test_empty_idempotency_key_is_rejected() {
        let executor = executor(
            MockIdempotencyStoreImpl::new(),
            MockLedgerRepositoryImpl::new(),
        );

        let result = executor
            .execute(TransactionType::TOPUP, sample_operation(), "  ")
            .await;

        assert_eq!(result.unwrap_err(), LedgerError::IdempotencyKeyRequired);
    }

    #[tokio::test]
    async fn test_claimed_key_fails_with_request_already_processing() {
        let mut idempotency = MockIdempotencyStoreImpl::new();
        idempotency.expect_check().returning(|_| Ok(None));
        idempotency.expect_claim().times(1).returning(|_, _| Ok(false));

        let executor = executor(idempotency, MockLedgerRepositoryImpl::new());
        let result = executor
            .execute(TransactionType::PURCHASE, sample_operation(), "s1")
            .await;

        assert_eq!(
            result.unwrap_err(),
            LedgerError::RequestAlreadyProcessing("s1".to_string())
        );
    }

    #[tokio::test]
    async fn test_success_stores_result_and_unclaims() {
        let mut idempotency = MockIdempotencyStoreImpl::new();
        let mut repo = MockLedgerRepositoryImpl::new();

        let written = completed_result();
        let expected = written.clone();

        idempotency.expect_check().returning(|_| Ok(None));
        idempotency.expect_claim().returning(|_, _| Ok(true));
        repo.expect_record_double_entry()
            .times(1)
            .returning(move |_, _, _, _| Ok(written.clone()));

        let stored = expected.clone();
        idempotency
            .expect_store()
            .withf(move |key, result, ttl| {
                key == "t1" && *result == stored && *ttl == SUCCESS_RESULT_TTL
            })
            .times(1)
            .returning(|_, _, _| Ok(()));
        idempotency
            .expect_unclaim()
            .with(eq("t1"))
            .times(1)
            .returning(|_| Ok(()));

        let executor = executor(idempotency, repo);
        let result = executor
            .execute(TransactionType::TOPUP, sample_operation(), "t1")
            .await
            .unwrap();

        assert_eq!(result, expected);
    }

    #[tokio::test]
    async fn test_domain_failure_is_cached_with_short_ttl_and_raised() {
        let mut idempotency = MockIdempotencyStoreImpl::new();
        let mut repo = MockLedgerRepositoryImpl::new();

        let wallet = WalletId::new();
        idempotency.expect_check().returning(|_| Ok(None));
        idempotency.expect_claim().returning(|_, _| Ok(true));
        repo.expect_record_double_entry()
            .returning(move |_, _, _, _| Err(LedgerError::InsufficientBalance(wallet)));

        idempotency
            .expect_store()
            .withf(|key, result, ttl| {
                key == "s2"
                    && result.status == TransactionStatus::FAILED
                    && result.error.is_some()
                    && *ttl == FAILURE_RESULT_TTL
            })
            .times(1)
            .returning(|_, _, _| Ok(()));
        idempotency.expect_unclaim().times(1).returning(|_| Ok(()));

        let executor = executor(idempotency, repo);
        let result = executor
            .execute(TransactionType::PURCHASE, sample_operation(), "s2")
            .await;

        assert_eq!(result.unwrap_err(), LedgerError::InsufficientBalance(wallet));
    }

    #[tokio::test]
    async fn test_infrastructure_failure_is_not_cached() {
        let mut idempotency = MockIdempotencyStoreImpl::new();
        let mut repo = MockLedgerRepositoryImpl::new();

        idempotency.expect_check().returning(|_| Ok(None));
        idempotency.expect_claim().returning(|_, _| Ok(true));
        repo.expect_record_double_entry()
            .returning(|_, _, _, _| Err(LedgerError::RepositoryError("db down".to_string())));

        // Ninguna expectativa de store: cachear esto envenenaría reintentos.
        idempotency.expect_unclaim().times(1).returning(|_| Ok(()));

        let executor = executor(idempotency, repo);
        let result = executor
            .execute(TransactionType::TOPUP, sample_operation(), "t9")
            .await;

        assert_eq!(
            result.unwrap_err(),
            LedgerError::RepositoryError("db down".to_string())
        );
    }

    #[tokio::test]
    async fn test_duplicate_key_reconstructs_completed_result() {
        let mut idempotency = MockIdempotencyStoreImpl::new();
        let mut repo = MockLedgerRepositoryImpl::new();

        let durable = completed_result();
        let expected = durable.clone();

        idempotency.expect_check().returning(|_| Ok(None));
        idempotency.expect_claim().returning(|_, _| Ok(true));
        // El INSERT de la cabecera chocó contra el índice único.
        repo.expect_record_double_entry().returning(|_, _, key, _| {
            Err(LedgerError::RequestAlreadyProcessing(key.to_string()))
        });
        repo.expect_find_result_by_idempotency_key()
            .with(eq("t1"))
            .times(1)
            .returning(move |_| Ok(Some(durable.clone())));

        idempotency
            .expect_store()
            .withf(|_, result, ttl| {
                result.status == TransactionStatus::COMPLETED && *ttl == SUCCESS_RESULT_TTL
            })
            .times(1)
            .returning(|_, _, _| Ok(()));
        idempotency.expect_unclaim().times(1).returning(|_| Ok(()));

        let executor = executor(idempotency, repo);
        let result = executor
            .execute(TransactionType::TOPUP, sample_operation(), "t1")
            .await
            .unwrap();

        assert_eq!(result, expected);
    }

    #[tokio::test]
    async fn test_duplicate_key_without_completed_row_propagates() {
        let mut idempotency = MockIdempotencyStoreImpl::new();
        let mut repo = MockLedgerRepositoryImpl::new();

        idempotency.expect_check().returning(|_| Ok(None));
        idempotency.expect_claim().returning(|_, _| Ok(true));
        repo.expect_record_double_entry().returning(|_, _, key, _| {
            Err(LedgerError::RequestAlreadyProcessing(key.to_string()))
        });
        repo.expect_find_result_by_idempotency_key()
            .returning(|_| Ok(None));
        idempotency.expect_unclaim().times(1).returning(|_| Ok(()));

        let executor = executor(idempotency, repo);
        let result = executor
            .execute(TransactionType::BONUS, sample_operation(), "b7")
            .await;

        assert_eq!(
            result.unwrap_err(),
            LedgerError::RequestAlreadyProcessing("b7".to_string())
        );
    }
}
