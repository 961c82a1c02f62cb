use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::response::ApiResponse;
use crate::domain::entities::{
    LedgerEntry, LedgerOperation, TransactionResult, TransactionType, Wallet,
};
use crate::domain::error::LedgerError;
use crate::domain::repository::WalletStats;
use crate::domain::types::{parse_amount, AssetTypeId};
use crate::use_cases::execute_transaction::TransactionExecutor;
use crate::use_cases::get_balance::GetBalanceUseCase;
use crate::use_cases::get_ledger_history::GetLedgerHistoryUseCase;
use crate::use_cases::get_wallet_stats::GetWalletStatsUseCase;
use crate::use_cases::provision_wallet::{
    ProvisionWalletUseCase, REVENUE_OWNER, TREASURY_OWNER,
};

// Estado compartido de la aplicación
pub struct AppState {
    pub execute_transaction_use_case: TransactionExecutor,
    pub provision_wallet_use_case: ProvisionWalletUseCase,
    pub get_balance_use_case: GetBalanceUseCase,
    pub get_ledger_history_use_case: GetLedgerHistoryUseCase,
    pub get_wallet_stats_use_case: GetWalletStatsUseCase,
}

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/wallet/topup", post(topup))
        .route("/api/v1/wallet/bonus", post(bonus))
        .route("/api/v1/wallet/spend", post(spend))
        .route("/api/v1/wallet/{user_id}/balance", get(get_balance))
        .route("/api/v1/wallet/{user_id}/ledger", get(get_ledger))
        .route("/api/v1/wallet/{user_id}/stats", get(get_wallet_stats))
        .with_state(state)
}

// DTO de entrada para las tres operaciones de escritura
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WalletOperationRequest {
    pub user_id: String,
    pub asset_type_id: Uuid,
    /// Monto decimal como string, formato `^\d+(\.\d{1,8})?$`.
    pub amount: String,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceQuery {
    pub asset_type_id: Option<Uuid>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerQuery {
    pub asset_type_id: Uuid,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsQuery {
    pub asset_type_id: Uuid,
}

/// El header `Idempotency-Key` es obligatorio y es la única clave que llega
/// al ejecutor.
fn require_idempotency_key(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get("Idempotency-Key")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ApiError(LedgerError::IdempotencyKeyRequired))
}

// Handler: Acuñar fondos desde la tesorería hacia el usuario
// POST /api/v1/wallet/topup
#[utoipa::path(
    post,
    path = "/api/v1/wallet/topup",
    request_body = WalletOperationRequest,
    responses(
        (status = 200, description = "Top-up applied", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid amount or missing Idempotency-Key"),
        (status = 409, description = "Request already processing"),
    )
)]
pub async fn topup(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<WalletOperationRequest>,
) -> Result<Json<ApiResponse<TransactionResult>>, ApiError> {
    execute_operation(
        &state,
        TransactionType::TOPUP,
        TREASURY_OWNER,
        Direction::ToUser,
        headers,
        payload,
        "Top-up",
    )
    .await
}

// Handler: Bono desde la cuenta de ingresos hacia el usuario
// POST /api/v1/wallet/bonus
#[utoipa::path(
    post,
    path = "/api/v1/wallet/bonus",
    request_body = WalletOperationRequest,
    responses(
        (status = 200, description = "Bonus applied", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid amount or missing Idempotency-Key"),
        (status = 409, description = "Request already processing"),
    )
)]
pub async fn bonus(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<WalletOperationRequest>,
) -> Result<Json<ApiResponse<TransactionResult>>, ApiError> {
    execute_operation(
        &state,
        TransactionType::BONUS,
        REVENUE_OWNER,
        Direction::ToUser,
        headers,
        payload,
        "Bonus",
    )
    .await
}

// Handler: Compra: el usuario paga hacia la cuenta de ingresos
// POST /api/v1/wallet/spend
#[utoipa::path(
    post,
    path = "/api/v1/wallet/spend",
    request_body = WalletOperationRequest,
    responses(
        (status = 200, description = "Purchase applied", body = ApiResponse<serde_json::Value>),
        (status = 422, description = "Insufficient balance"),
        (status = 400, description = "Invalid amount or missing Idempotency-Key"),
        (status = 409, description = "Request already processing"),
    )
)]
pub async fn spend(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<WalletOperationRequest>,
) -> Result<Json<ApiResponse<TransactionResult>>, ApiError> {
    execute_operation(
        &state,
        TransactionType::PURCHASE,
        REVENUE_OWNER,
        Direction::FromUser,
        headers,
        payload,
        "Purchase",
    )
    .await
}

enum Direction {
    /// La billetera de sistema debita, el usuario acredita (TOPUP/BONUS).
    ToUser,
    /// El usuario debita, la billetera de sistema acredita (PURCHASE).
    FromUser,
}

/// Cableado común: resuelve billeteras (auto-creando la del usuario), valida
/// el monto y delega en el ejecutor.
async fn execute_operation(
    state: &AppState,
    transaction_type: TransactionType,
    system_owner: &str,
    direction: Direction,
    headers: HeaderMap,
    payload: WalletOperationRequest,
    description: &str,
) -> Result<Json<ApiResponse<TransactionResult>>, ApiError> {
    let idempotency_key = require_idempotency_key(&headers)?;
    let amount = parse_amount(&payload.amount)?;
    let asset = AssetTypeId(payload.asset_type_id);

    state.provision_wallet_use_case.active_asset(asset).await?;

    let system_wallet = state
        .provision_wallet_use_case
        .system_wallet(system_owner, asset)
        .await?;
    let user_wallet = state
        .provision_wallet_use_case
        .user_wallet(&payload.user_id, asset)
        .await?;

    let (from, to) = match direction {
        Direction::ToUser => (system_wallet.id, user_wallet.id),
        Direction::FromUser => (user_wallet.id, system_wallet.id),
    };

    let operation = LedgerOperation::new(
        Some(from),
        to,
        asset,
        amount,
        Some(description.to_string()),
        payload.metadata,
    )?;

    let result = state
        .execute_transaction_use_case
        .execute(transaction_type, operation, &idempotency_key)
        .await?;

    Ok(Json(ApiResponse::success(result)))
}

// Handler: Saldos del usuario (uno o todos los activos)
// GET /api/v1/wallet/{user_id}/balance
#[utoipa::path(
    get,
    path = "/api/v1/wallet/{user_id}/balance",
    params(("user_id" = String, Path, description = "Owner id")),
    responses(
        (status = 200, description = "User wallets", body = ApiResponse<serde_json::Value>),
    )
)]
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(query): Query<BalanceQuery>,
) -> Result<Json<ApiResponse<Vec<Wallet>>>, ApiError> {
    let wallets = state
        .get_balance_use_case
        .execute(&user_id, query.asset_type_id.map(AssetTypeId))
        .await?;

    Ok(Json(ApiResponse::success(wallets)))
}

// Handler: Historial de ledger de la billetera del usuario (paginado)
// GET /api/v1/wallet/{user_id}/ledger
#[utoipa::path(
    get,
    path = "/api/v1/wallet/{user_id}/ledger",
    params(("user_id" = String, Path, description = "Owner id")),
    responses(
        (status = 200, description = "Ledger entries, newest first", body = ApiResponse<serde_json::Value>),
    )
)]
pub async fn get_ledger(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(query): Query<LedgerQuery>,
) -> Result<Json<ApiResponse<Vec<LedgerEntry>>>, ApiError> {
    let entries = state
        .get_ledger_history_use_case
        .execute(
            &user_id,
            AssetTypeId(query.asset_type_id),
            query.limit,
            query.offset,
        )
        .await?;

    Ok(Json(ApiResponse::success(entries)))
}

// Handler: Estadísticas agregadas de la billetera del usuario
// GET /api/v1/wallet/{user_id}/stats
#[utoipa::path(
    get,
    path = "/api/v1/wallet/{user_id}/stats",
    params(("user_id" = String, Path, description = "Owner id")),
    responses(
        (status = 200, description = "Wallet statistics", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "No wallet for user and asset"),
    )
)]
pub async fn get_wallet_stats(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<ApiResponse<WalletStats>>, ApiError> {
    let stats = state
        .get_wallet_stats_use_case
        .execute(&user_id, AssetTypeId(query.asset_type_id))
        .await?;

    Ok(Json(ApiResponse::success(stats)))
}
