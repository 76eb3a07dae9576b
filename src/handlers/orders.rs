use super::{
    common::{created_response, success_response, JsonBody, MessageResponse},
    AppState,
};
use crate::{
    auth::AuthUser,
    errors::ServiceError,
    models::{CreateOrderRequest, UpdateOrderRequest},
};
use axum::{
    extract::{Path, State},
    response::Response,
};
use uuid::Uuid;

/// `POST /orders`
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(request): JsonBody<CreateOrderRequest>,
) -> Result<Response, ServiceError> {
    let order = state
        .services
        .orders
        .create_order(user.owner_id, request)
        .await?;
    Ok(created_response(order))
}

/// `GET /orders/:id`
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let order = state.services.orders.get_order(user.owner_id, id).await?;
    Ok(success_response(order))
}

/// `PATCH /orders/:id`
pub async fn update_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    JsonBody(request): JsonBody<UpdateOrderRequest>,
) -> Result<Response, ServiceError> {
    state
        .services
        .orders
        .update_order(user.owner_id, id, request)
        .await?;
    Ok(created_response(MessageResponse::new(
        "Successfully updated order!",
    )))
}

/// `DELETE /orders/:id` cancels the order.
pub async fn cancel_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state.services.orders.cancel_order(user.owner_id, id).await?;
    Ok(success_response(MessageResponse::new(
        "Cancellation of order successful!",
    )))
}

/// `GET /orders/:id/purchase_returns`
pub async fn get_order_returns(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let summary = state
        .services
        .orders
        .order_returns(user.owner_id, id)
        .await?;
    Ok(success_response(summary))
}
