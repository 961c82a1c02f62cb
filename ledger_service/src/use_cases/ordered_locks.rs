use crate::domain::error::LedgerError;
use crate::domain::gateways::LockStore;
use crate::domain::types::WalletId;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// TTL de cada lock de billetera. Red de seguridad, no mecanismo de
/// correctitud: el trabajo debe terminar bien por debajo de este valor.
const LOCK_TTL: Duration = Duration::from_secs(30);

/// Reintentos de adquisición tras el intento inicial.
const MAX_RETRIES: u32 = 3;

/// Backoff base; se duplica por reintento (100ms, 200ms, 400ms).
const BASE_BACKOFF: Duration = Duration::from_millis(100);

/// Coordinador de locks ordenados.
///
/// Dado un conjunto de billeteras, adquiere sus locks en orden canónico
/// (lexicográfico bytewise sobre la forma textual del id), ejecuta el trabajo
/// del caller y los libera en orden inverso. Dos llamadas concurrentes que
/// compartan billeteras las intentan siempre en el mismo orden, así que el
/// ciclo clásico de espera cruzada no puede formarse.
#[derive(Clone)]
pub struct OrderedLockCoordinator {
    lock_store: Arc<dyn LockStore>,
    lock_ttl: Duration,
    max_retries: u32,
    base_backoff: Duration,
}

impl OrderedLockCoordinator {
    pub fn new(lock_store: Arc<dyn LockStore>) -> Self {
        Self {
            lock_store,
            lock_ttl: LOCK_TTL,
            max_retries: MAX_RETRIES,
            base_backoff: BASE_BACKOFF,
        }
    }

    /// Ajusta los parámetros de reintento. Pensado para tests con backoff corto.
    pub fn with_retry_policy(mut self, max_retries: u32, base_backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.base_backoff = base_backoff;
        self
    }

    /// Ejecuta `work` con los locks de todas las billeteras tomados.
    ///
    /// Si alguna adquisición falla se liberan los locks ya tomados y el
    /// intento completo se repite con backoff exponencial. Mantener locks
    /// parciales durante el backoff alargaría la ventana de contención.
    pub async fn with_wallet_locks<F, Fut, T>(
        &self,
        wallet_ids: &[WalletId],
        work: F,
    ) -> Result<T, LedgerError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, LedgerError>>,
    {
        let names = Self::canonical_lock_names(wallet_ids);
        let held = self.acquire_all(&names).await?;

        let result = work().await;

        self.release_all(held).await;
        result
    }

    /// Orden canónico: lexicográfico bytewise sobre el UUID textual en
    /// minúsculas. Idéntico en todos los procesos.
    fn canonical_lock_names(wallet_ids: &[WalletId]) -> Vec<String> {
        let mut names: Vec<String> = wallet_ids
            .iter()
            .map(|id| format!("wallet:{}", id))
            .collect();
        names.sort();
        names.dedup();
        names
    }

    async fn acquire_all(&self, names: &[String]) -> Result<Vec<(String, String)>, LedgerError> {
        for attempt in 0..=self.max_retries {
            match self.try_acquire_round(names).await {
                Some(held) => return Ok(held),
                None => {
                    if attempt < self.max_retries {
                        let backoff = self.base_backoff * 2u32.pow(attempt);
                        tokio::time::sleep(backoff).await;
                    }
                }
            }
        }

        Err(LedgerError::LockUnavailable)
    }

    /// Un intento completo: o se toman todos los locks, o ninguno queda tomado.
    async fn try_acquire_round(&self, names: &[String]) -> Option<Vec<(String, String)>> {
        let mut held: Vec<(String, String)> = Vec::with_capacity(names.len());

        for name in names {
            match self.lock_store.acquire(name, self.lock_ttl).await {
                Ok(Some(token)) => held.push((name.clone(), token)),
                Ok(None) => {
                    self.release_all(held).await;
                    return None;
                }
                // Un error de red al adquirir cuenta como lock no disponible:
                // se reintenta y, agotado el presupuesto, sale LockUnavailable.
                Err(e) => {
                    warn!("Lock store error while acquiring {}: {}", name, e);
                    self.release_all(held).await;
                    return None;
                }
            }
        }

        Some(held)
    }

    /// Libera en orden inverso de adquisición. Los errores se loguean y se
    /// tragan: el TTL garantiza la liberación eventual.
    async fn release_all(&self, mut held: Vec<(String, String)>) {
        while let Some((name, token)) = held.pop() {
            if let Err(e) = self.lock_store.release(&name, &token).await {
                warn!("Failed to release lock {}: {}. TTL will expire it.", name, e);
            }
        }
    }
}
