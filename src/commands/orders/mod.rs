//! Order lifecycle: creation, edits and cancellation.

pub mod cancel_order_command;
pub mod create_order_command;
pub mod update_order_command;

pub use cancel_order_command::CancelOrderCommand;
pub use create_order_command::CreateOrderCommand;
pub use update_order_command::UpdateOrderCommand;

use rust_decimal::Decimal;
use sea_orm::ConnectionTrait;
use tracing::warn;
use uuid::Uuid;

use crate::{
    auth::ownership::assert_owned,
    entities::customer,
    errors::ServiceError,
    models::OrderLineInput,
    repositories::{CustomerRepository, ProductRepository},
    services::reconciliation::{first_stock_exceeded, first_unresolved},
};

pub(crate) const CUSTOMER_MISSING: &str = "The customer entered does not exist!";
pub(crate) const CUSTOMER_BLACKLISTED: &str =
    "This customer is blacklisted from this store. Update its customer info if you think this is wrong.";
pub(crate) const PRODUCTS_MISSING: &str = "Some products entered have not been created yet!";
pub(crate) const CREDIT_TOO_LARGE: &str = "The credit entered exceeds the total purchase amount!";

/// Loads the customer and checks it can receive new orders.
pub(crate) async fn ensure_customer_eligible<C: ConnectionTrait>(
    conn: &C,
    owner_id: Uuid,
    customer_id: Uuid,
) -> Result<customer::Model, ServiceError> {
    let customer = CustomerRepository::new(conn)
        .find_by_id(customer_id)
        .await?
        .filter(|c| c.is_active)
        .ok_or_else(|| ServiceError::ValidationError(CUSTOMER_MISSING.to_string()))?;

    assert_owned(&customer, owner_id)?;

    if customer.is_blacklisted {
        warn!(%customer_id, "order rejected for blacklisted customer");
        return Err(ServiceError::ValidationError(
            CUSTOMER_BLACKLISTED.to_string(),
        ));
    }

    Ok(customer)
}

/// Every line must name an active product of the owner with enough stock.
/// The first offending line in input order is reported.
pub(crate) async fn ensure_lines_available<C: ConnectionTrait>(
    conn: &C,
    owner_id: Uuid,
    lines: &[OrderLineInput],
) -> Result<(), ServiceError> {
    let codes: Vec<String> = lines.iter().map(|l| l.code.clone()).collect();
    let products = ProductRepository::new(conn)
        .find_active_by_codes(owner_id, &codes)
        .await?;

    if let Some(code) = first_unresolved(lines, &products) {
        warn!(%owner_id, code, "order references unknown product");
        return Err(ServiceError::ValidationError(PRODUCTS_MISSING.to_string()));
    }

    if let Some(code) = first_stock_exceeded(lines, &products) {
        return Err(ServiceError::StockExceeded {
            code: code.to_string(),
        });
    }

    Ok(())
}

pub(crate) fn ensure_credit_within(credit: Decimal, total: Decimal) -> Result<(), ServiceError> {
    if credit > total {
        return Err(ServiceError::ValidationError(CREDIT_TOO_LARGE.to_string()));
    }
    Ok(())
}
