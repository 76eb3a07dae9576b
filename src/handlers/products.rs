use super::{
    common::{created_response, success_response, JsonBody, MessageResponse},
    AppState,
};
use crate::{
    auth::AuthUser,
    errors::ServiceError,
    models::{CreateProductRequest, RestockProductRequest},
};
use axum::{
    extract::{Path, State},
    response::Response,
};
use uuid::Uuid;

pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(request): JsonBody<CreateProductRequest>,
) -> Result<Response, ServiceError> {
    let product = state
        .services
        .products
        .create_product(user.owner_id, request)
        .await?;
    Ok(created_response(product))
}

pub async fn restock_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    JsonBody(request): JsonBody<RestockProductRequest>,
) -> Result<Response, ServiceError> {
    let product = state
        .services
        .products
        .restock(user.owner_id, id, request)
        .await?;
    Ok(success_response(product))
}

pub async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state.services.products.deactivate(user.owner_id, id).await?;
    Ok(success_response(MessageResponse::new(
        "Successfully deleted product!",
    )))
}
