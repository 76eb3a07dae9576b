use super::{
    common::{created_response, success_response, JsonBody},
    AppState,
};
use crate::{auth::AuthUser, errors::ServiceError, models::CreateReturnRequest};
use axum::{
    extract::{Path, State},
    response::Response,
};
use uuid::Uuid;

/// `POST /purchase_returns`
pub async fn create_return(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(request): JsonBody<CreateReturnRequest>,
) -> Result<Response, ServiceError> {
    let created = state
        .services
        .returns
        .create_return(user.owner_id, request)
        .await?;
    Ok(created_response(created))
}

/// `GET /purchase_returns/:id`
pub async fn get_return(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let found = state.services.returns.get_return(user.owner_id, id).await?;
    Ok(success_response(found))
}

/// `GET /purchase_returns/:po_no/order`
pub async fn get_returnable_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(po_no): Path<String>,
) -> Result<Response, ServiceError> {
    let order = state
        .services
        .returns
        .returnable_order(user.owner_id, &po_no)
        .await?;
    Ok(success_response(order))
}
