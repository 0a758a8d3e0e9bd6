use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;

use crate::adapter::driver::request_dto::{CreateReservationRequestBody, OwnerRequestsQueryParams};
use crate::adapter::driver::response_dto::{
    CountResponse, ReservationRequestResponse, TermAttachmentResponse,
};
use crate::application::service::{
    AuthorizationService, ReservationQueryService, ReservationRequestService,
};
use crate::application::ApplicationError;
use crate::domain::error::DomainError;
use crate::domain::model::{
    AccommodationId, ReservationRequestId, ReservationStatus, UserId, UserRole,
};
use crate::domain::port::{Caller, GatewayError};
use crate::domain::service::TermAttachment;

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

// アプリケーションサービスを含む状態
#[derive(Clone)]
pub struct AppState {
    pub reservation_service: Arc<ReservationRequestService>,
    pub query_service: Arc<ReservationQueryService>,
    pub authorization_service: Arc<AuthorizationService>,
}

// REST APIルーターを作成
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/reservationRequest", post(create_reservation_request))
        .route("/api/reservationRequest/guest/:id", get(get_guest_active))
        .route("/api/reservationRequest/guest/:id/all", get(get_guest_all))
        .route(
            "/api/reservationRequest/guest/:id/host/:host_id",
            get(was_guest_hosted_by),
        )
        .route(
            "/api/reservationRequest/guest/:id/accommodation/:accommodation_id",
            get(was_guest_at_accommodation),
        )
        .route("/api/reservationRequest/owner/:id", get(get_owner_active))
        .route("/api/reservationRequest/owner/:id/all", get(get_owner_all))
        .route(
            "/api/reservationRequest/:id",
            put(accept_reservation_request).delete(delete_reservation_request),
        )
        .route(
            "/api/reservationRequest/:id/cancel",
            put(cancel_reservation_request),
        )
        .route(
            "/api/reservationRequest/:id/reservedTerm",
            put(attach_reserved_term),
        )
        .route(
            "/api/reservationRequest/:id/cancelled",
            get(count_cancelled),
        )
}

// ヘルスチェックエンドポイント
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "reservation-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

// Authorizationヘッダーをユーザーサービスに転送して呼び出し元を解決
async fn authorize(state: &AppState, headers: &HeaderMap, role: UserRole) -> ApiResult<Caller> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    state
        .authorization_service
        .authorize(token, role)
        .await
        .map_err(map_application_error)
}

fn parse_request_id(raw: &str) -> ApiResult<ReservationRequestId> {
    ReservationRequestId::from_string(raw).map_err(|e| map_application_error(e.into()))
}

// 状態を変更する操作は別タスクで実行し、クライアントの切断で中断されないようにする
async fn run_detached<T, F>(operation: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: Future<Output = Result<T, ApplicationError>> + Send + 'static,
{
    match tokio::spawn(operation).await {
        Ok(result) => result.map_err(map_application_error),
        Err(e) => {
            tracing::error!(error = %e, "操作の実行タスクが異常終了しました");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError {
                    error: "内部エラーが発生しました".to_string(),
                    code: "INTERNAL_ERROR".to_string(),
                }),
            ))
        }
    }
}

// 予約リクエスト作成エンドポイント
async fn create_reservation_request(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateReservationRequestBody>,
) -> ApiResult<(StatusCode, Json<ReservationRequestResponse>)> {
    let caller = authorize(&state, &headers, UserRole::Guest).await?;

    let start_date = request.parse_start_date().ok_or_else(|| {
        map_application_error(
            DomainError::Validation(format!("開始日の形式が不正です: {}", request.start_date))
                .into(),
        )
    })?;

    let service = state.reservation_service.clone();
    let created = run_detached(async move {
        service
            .create(
                caller.id,
                start_date,
                request.number_of_days,
                AccommodationId::new(request.accommodation_id),
                request.guest_number,
            )
            .await
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ReservationRequestResponse::from_request(&created)),
    ))
}

// ゲストの有効な予約一覧エンドポイント
async fn get_guest_active(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guest_id): Path<u64>,
) -> ApiResult<Json<Vec<ReservationRequestResponse>>> {
    authorize(&state, &headers, UserRole::Guest).await?;

    let requests = state
        .query_service
        .get_active_by_guest(UserId::new(guest_id))
        .await
        .map_err(map_application_error)?;

    Ok(Json(
        requests
            .iter()
            .map(ReservationRequestResponse::from_request)
            .collect(),
    ))
}

// ゲストのすべての予約リクエスト一覧エンドポイント
async fn get_guest_all(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guest_id): Path<u64>,
) -> ApiResult<Json<Vec<ReservationRequestResponse>>> {
    authorize(&state, &headers, UserRole::Guest).await?;

    let requests = state
        .query_service
        .get_all_by_guest(UserId::new(guest_id))
        .await
        .map_err(map_application_error)?;

    Ok(Json(
        requests
            .iter()
            .map(ReservationRequestResponse::from_request)
            .collect(),
    ))
}

// オーナーの有効な予約一覧エンドポイント
async fn get_owner_active(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(owner_id): Path<u64>,
) -> ApiResult<Json<Vec<ReservationRequestResponse>>> {
    authorize(&state, &headers, UserRole::Host).await?;

    let requests = state
        .query_service
        .get_active_by_owner(UserId::new(owner_id))
        .await
        .map_err(map_application_error)?;

    Ok(Json(
        requests
            .iter()
            .map(ReservationRequestResponse::from_request)
            .collect(),
    ))
}

// オーナーの予約リクエスト一覧エンドポイント（ステータスで絞り込み可能）
async fn get_owner_all(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(owner_id): Path<u64>,
    query: Result<Query<OwnerRequestsQueryParams>, QueryRejection>,
) -> ApiResult<Json<Vec<ReservationRequestResponse>>> {
    let Query(params) = query.map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ApiError {
                error: "無効なクエリパラメータです".to_string(),
                code: "INVALID_PARAMETER".to_string(),
            }),
        )
    })?;

    let status = match params.status.as_deref() {
        Some(raw) => Some(ReservationStatus::from_string(raw).map_err(|_| {
            (
                StatusCode::BAD_REQUEST,
                Json(ApiError {
                    error: format!("無効なステータス値: {}", raw),
                    code: "INVALID_STATUS".to_string(),
                }),
            )
        })?),
        None => None,
    };

    authorize(&state, &headers, UserRole::Host).await?;

    let requests = state
        .query_service
        .get_by_owner(UserId::new(owner_id), status)
        .await
        .map_err(map_application_error)?;

    Ok(Json(
        requests
            .iter()
            .map(ReservationRequestResponse::from_request)
            .collect(),
    ))
}

// 予約リクエスト承認エンドポイント
async fn accept_reservation_request(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<ReservationRequestResponse>> {
    let id = parse_request_id(&id)?;
    let caller = authorize(&state, &headers, UserRole::Host).await?;

    let service = state.reservation_service.clone();
    let accepted = run_detached(async move { service.accept(id, caller.id).await }).await?;

    Ok(Json(ReservationRequestResponse::from_request(&accepted)))
}

// 予約キャンセルエンドポイント
async fn cancel_reservation_request(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<ReservationRequestResponse>> {
    let id = parse_request_id(&id)?;
    let caller = authorize(&state, &headers, UserRole::Guest).await?;

    let service = state.reservation_service.clone();
    let cancelled = run_detached(async move { service.cancel(id, caller.id).await }).await?;

    Ok(Json(ReservationRequestResponse::from_request(&cancelled)))
}

// 予約リクエスト削除エンドポイント
async fn delete_reservation_request(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_request_id(&id)?;
    let caller = authorize(&state, &headers, UserRole::Guest).await?;

    let service = state.reservation_service.clone();
    run_detached(async move { service.delete(id, caller.id).await }).await?;

    Ok(StatusCode::OK)
}

// 予約済み期間の再紐付けエンドポイント
async fn attach_reserved_term(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<(StatusCode, Json<TermAttachmentResponse>)> {
    let id = parse_request_id(&id)?;
    authorize(&state, &headers, UserRole::Host).await?;

    let service = state.reservation_service.clone();
    let attachment = run_detached(async move { service.attach_external_term(id).await }).await?;

    let status = match attachment {
        TermAttachment::Attached(_) => StatusCode::OK,
        TermAttachment::Failed(_) => StatusCode::BAD_GATEWAY,
    };
    Ok((status, Json(TermAttachmentResponse::from_attachment(&attachment))))
}

// ゲストのキャンセル件数エンドポイント
async fn count_cancelled(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guest_id): Path<u64>,
) -> ApiResult<Json<CountResponse>> {
    authorize(&state, &headers, UserRole::Host).await?;

    let count = state
        .query_service
        .count_cancelled(UserId::new(guest_id))
        .await
        .map_err(map_application_error)?;

    Ok(Json(CountResponse { count }))
}

// ゲストが指定ホストの施設に宿泊したことがあるか
async fn was_guest_hosted_by(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((guest_id, host_id)): Path<(u64, u64)>,
) -> ApiResult<Json<bool>> {
    authorize(&state, &headers, UserRole::Guest).await?;

    state
        .query_service
        .was_guest_hosted_by(UserId::new(guest_id), UserId::new(host_id))
        .await
        .map(Json)
        .map_err(map_application_error)
}

// ゲストが指定の宿泊施設に宿泊したことがあるか
async fn was_guest_at_accommodation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((guest_id, accommodation_id)): Path<(u64, u64)>,
) -> ApiResult<Json<bool>> {
    authorize(&state, &headers, UserRole::Guest).await?;

    state
        .query_service
        .was_guest_at_accommodation(UserId::new(guest_id), AccommodationId::new(accommodation_id))
        .await
        .map(Json)
        .map_err(map_application_error)
}

fn api_error(status: StatusCode, error: String, code: &str) -> (StatusCode, Json<ApiError>) {
    (
        status,
        Json(ApiError {
            error,
            code: code.to_string(),
        }),
    )
}

// アプリケーションエラーをHTTPエラーにマッピング
fn map_application_error(err: ApplicationError) -> (StatusCode, Json<ApiError>) {
    match err {
        ApplicationError::DomainError(domain_err) => map_domain_error(domain_err),
        ApplicationError::RepositoryError(repo_err) => {
            tracing::error!(error = %repo_err, "リポジトリ操作に失敗しました");
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                repo_err.to_string(),
                "REPOSITORY_ERROR",
            )
        }
        ApplicationError::GatewayError(GatewayError::NotFound(msg)) => {
            api_error(StatusCode::NOT_FOUND, msg, "REMOTE_NOT_FOUND")
        }
        ApplicationError::GatewayError(gateway_err) => {
            tracing::warn!(error = %gateway_err, "外部サービスの呼び出しに失敗しました");
            api_error(
                StatusCode::BAD_GATEWAY,
                gateway_err.to_string(),
                "GATEWAY_ERROR",
            )
        }
        ApplicationError::NotFound(msg) => api_error(StatusCode::NOT_FOUND, msg, "NOT_FOUND"),
        ApplicationError::Unauthorized(msg) => {
            api_error(StatusCode::UNAUTHORIZED, msg, "UNAUTHORIZED")
        }
    }
}

// ドメインエラーを適切なHTTPステータスコードとエラーコードにマッピング
fn map_domain_error(domain_err: DomainError) -> (StatusCode, Json<ApiError>) {
    let message = domain_err.to_string();
    match domain_err {
        DomainError::Validation(_) => {
            api_error(StatusCode::BAD_REQUEST, message, "VALIDATION_ERROR")
        }
        DomainError::Unavailable(_) => api_error(
            StatusCode::BAD_REQUEST,
            message,
            "ACCOMMODATION_UNAVAILABLE",
        ),
        DomainError::Conflict(_) => {
            api_error(StatusCode::CONFLICT, message, "RESERVATION_CONFLICT")
        }
        DomainError::AccessDenied(_) => {
            api_error(StatusCode::FORBIDDEN, message, "ACCESS_DENIED")
        }
        DomainError::InvalidState(_) => api_error(
            StatusCode::BAD_REQUEST,
            message,
            "INVALID_RESERVATION_STATE",
        ),
    }
}
