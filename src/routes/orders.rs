use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    checkout::IDEMPOTENCY_KEY_HEADER,
    dto::orders::OrderRequest,
    error::{AppError, AppResult},
    models::Order,
    response::ApiResponse,
    services::order_service::{self, Placed},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order))
        .route("/{order_number}", get(get_order))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = OrderRequest,
    params(
        ("Idempotency-Key" = Option<Uuid>, Header, description = "Reused on retries of the same checkout")
    ),
    responses(
        (status = 201, description = "Order placed", body = ApiResponse<Order>),
        (status = 200, description = "Order already placed for this idempotency key", body = ApiResponse<Order>),
        (status = 400, description = "Invalid order"),
        (status = 409, description = "Idempotency key is in flight or was used for a different order"),
    ),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<OrderRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<Order>>)> {
    let Json(payload) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let idempotency_key = idempotency_key(&headers)?;

    match order_service::create_order(&state, idempotency_key, payload).await? {
        Placed::Created(body) => Ok((StatusCode::CREATED, Json(body))),
        Placed::Replayed(body) => Ok((StatusCode::OK, Json(body))),
    }
}

#[utoipa::path(
    get,
    path = "/api/orders/{order_number}",
    params(
        ("order_number" = String, Path, description = "Order number, e.g. CL000123")
    ),
    responses(
        (status = 200, description = "Order", body = ApiResponse<Order>),
        (status = 404, description = "Order not found"),
    ),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let body = order_service::get_order_by_number(&state, &order_number).await?;
    Ok(Json(body))
}

fn idempotency_key(headers: &HeaderMap) -> AppResult<Option<Uuid>> {
    let Some(value) = headers.get(IDEMPOTENCY_KEY_HEADER) else {
        return Ok(None);
    };
    value
        .to_str()
        .ok()
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
        .map(Some)
        .ok_or_else(|| AppError::BadRequest("Idempotency-Key must be a UUID".into()))
}
