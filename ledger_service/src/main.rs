use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::FmtSubscriber;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use ledger_service::{
    api::http_routes::{routes, AppState},
    domain::gateways::{IdempotencyStore, LockStore},
    domain::repository::{AssetTypeRepository, LedgerRepository, WalletRepository},
    infrastructure::{
        gateways::{
            redis_idempotency_store::RedisIdempotencyStore, redis_lock_store::RedisLockStore,
        },
        persistence::{
            asset_type_repository::PostgresAssetTypeRepository,
            ledger_repository::PostgresLedgerRepository, wallet_repository::PostgresWalletRepository,
        },
    },
    use_cases::{
        execute_transaction::TransactionExecutor, get_balance::GetBalanceUseCase,
        get_ledger_history::GetLedgerHistoryUseCase, get_wallet_stats::GetWalletStatsUseCase,
        ordered_locks::OrderedLockCoordinator, provision_wallet::ProvisionWalletUseCase,
    },
};

#[derive(OpenApi)]
#[openapi(
    paths(
        ledger_service::api::http_routes::topup,
        ledger_service::api::http_routes::bonus,
        ledger_service::api::http_routes::spend,
        ledger_service::api::http_routes::get_balance,
        ledger_service::api::http_routes::get_ledger,
        ledger_service::api::http_routes::get_wallet_stats
    ),
    components(schemas(
        ledger_service::api::http_routes::WalletOperationRequest,
        ledger_service::api::response::ApiResponse<serde_json::Value>
    ))
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Cargar variables de entorno
    dotenv().ok();

    // 2. Configurar Logging/Tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(tracing::Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting Ledger Service...");

    // 3. Configurar Conexión a Base de Datos
    let database_url = env::var("DATABASE_URL")?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    info!("Connected to Database");

    // 4. Configurar Conexión al Key/Value Store (locks + idempotencia)
    let redis_url = env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".to_string());
    let redis_client = redis::Client::open(redis_url)?;
    let redis_conn = redis_client.get_multiplexed_tokio_connection().await?;

    info!("Connected to Key/Value Store");

    // 5. Instanciar Dependencias (Infraestructura)
    let wallet_repo: Arc<dyn WalletRepository> =
        Arc::new(PostgresWalletRepository::new(pool.clone()));
    let asset_repo: Arc<dyn AssetTypeRepository> =
        Arc::new(PostgresAssetTypeRepository::new(pool.clone()));
    let ledger_repo: Arc<dyn LedgerRepository> =
        Arc::new(PostgresLedgerRepository::new(pool.clone()));
    let lock_store: Arc<dyn LockStore> = Arc::new(RedisLockStore::new(redis_conn.clone()));
    let idempotency_store: Arc<dyn IdempotencyStore> =
        Arc::new(RedisIdempotencyStore::new(redis_conn));

    // 6. Instanciar Casos de Uso
    let coordinator = OrderedLockCoordinator::new(lock_store);
    let execute_transaction_use_case =
        TransactionExecutor::new(idempotency_store, coordinator, ledger_repo.clone());
    let provision_wallet_use_case = ProvisionWalletUseCase::new(wallet_repo.clone(), asset_repo);
    let get_balance_use_case = GetBalanceUseCase::new(wallet_repo.clone());
    let get_ledger_history_use_case =
        GetLedgerHistoryUseCase::new(wallet_repo.clone(), ledger_repo.clone());
    let get_wallet_stats_use_case = GetWalletStatsUseCase::new(wallet_repo, ledger_repo);

    // 7. Configurar Estado de la App Axum
    let app_state = Arc::new(AppState {
        execute_transaction_use_case,
        provision_wallet_use_case,
        get_balance_use_case,
        get_ledger_history_use_case,
        get_wallet_stats_use_case,
    });

    // 8. Configurar Rutas y Servidor HTTP
    let app = routes(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    info!("HTTP Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
