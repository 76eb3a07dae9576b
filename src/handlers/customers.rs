use super::{
    common::{created_response, success_response, JsonBody},
    AppState,
};
use crate::{
    auth::AuthUser,
    errors::ServiceError,
    models::{BlacklistCustomerRequest, CreateCustomerRequest},
};
use axum::{
    extract::{Path, State},
    response::Response,
};
use uuid::Uuid;

pub async fn create_customer(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(request): JsonBody<CreateCustomerRequest>,
) -> Result<Response, ServiceError> {
    let customer = state
        .services
        .customers
        .create_customer(user.owner_id, request)
        .await?;
    Ok(created_response(customer))
}

pub async fn set_blacklisted(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    JsonBody(request): JsonBody<BlacklistCustomerRequest>,
) -> Result<Response, ServiceError> {
    let customer = state
        .services
        .customers
        .set_blacklisted(user.owner_id, id, request)
        .await?;
    Ok(success_response(customer))
}
