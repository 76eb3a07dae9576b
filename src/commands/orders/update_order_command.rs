use crate::{
    auth::ownership::assert_owned,
    commands::{transaction_error, with_context, Command},
    db::DbPool,
    entities::{order, OrderStatus},
    errors::ServiceError,
    events::{Event, EventSender},
    metrics,
    models::{OrderLineInput, UpdateOrderRequest},
    repositories::{OrderRepository, ReturnRepository},
    services::{
        inventory::StockLedger,
        reconciliation::{lines_total, remaining_total},
    },
};
use chrono::Utc;
use lazy_static::lazy_static;
use prometheus::{IntCounter, IntCounterVec};
use sea_orm::{DatabaseTransaction, Set, TransactionTrait};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use super::{ensure_credit_within, ensure_customer_eligible, ensure_lines_available};

lazy_static! {
    static ref ORDERS_UPDATED: IntCounter =
        metrics::register_counter("orders_updated_total", "Total number of order edits");
    static ref ORDERS_SUBMITTED_ON_UPDATE: IntCounter = metrics::register_counter(
        "orders_submitted_on_update_total",
        "Total number of DRAFT orders moved to SUBMIT"
    );
    static ref ORDER_UPDATE_FAILURES: IntCounterVec = metrics::register_counter_vec(
        "order_update_failures_total",
        "Total number of failed order edits",
        &["error_type"]
    );
}

const UPDATE_FAILED: &str = "Cannot update order information. Please try again later!";
const ORDER_NOT_FOUND: &str = "Order not found!";
const SUBMITTED_TO_DRAFT: &str = "Cannot update the status of an order once the order is submitted!";
const CANCELLED_EDIT: &str = "Cannot update a cancelled order!";

/// Edits an order.
///
/// A DRAFT order may change customer, lines, credit, remarks and status; the
/// move to SUBMIT withdraws stock for the effective lines exactly once. A
/// SUBMIT order only accepts credit and remarks, and any supplied lines or
/// customer are ignored.
#[derive(Debug, Clone)]
pub struct UpdateOrderCommand {
    pub owner_id: Uuid,
    pub order_id: Uuid,
    pub request: UpdateOrderRequest,
}

#[async_trait::async_trait]
impl Command for UpdateOrderCommand {
    type Result = order::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(owner_id = %self.owner_id, order_id = %self.order_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let (updated, events) = self.update(db_pool.as_ref()).await.map_err(|e| {
            ORDER_UPDATE_FAILURES.with_label_values(&[e.kind()]).inc();
            error!(error = %e, "order update failed");
            with_context(e, UPDATE_FAILED)
        })?;

        if events
            .iter()
            .any(|e| matches!(e, Event::OrderSubmitted(_)))
        {
            ORDERS_SUBMITTED_ON_UPDATE.inc();
        }
        for event in events {
            event_sender.send_or_log(event).await;
        }

        ORDERS_UPDATED.inc();
        info!(status = %updated.status, credit = %updated.credit, "order updated");

        Ok(updated)
    }
}

impl UpdateOrderCommand {
    async fn update(&self, db: &DbPool) -> Result<(order::Model, Vec<Event>), ServiceError> {
        let patch = self.request.clone().into_normalized()?;
        let target = patch.target_status()?;
        let owner_id = self.owner_id;
        let order_id = self.order_id;

        db.transaction::<_, (order::Model, Vec<Event>), ServiceError>(|txn| {
            Box::pin(async move {
                let current = OrderRepository::new(txn)
                    .find_by_id(order_id)
                    .await?
                    .ok_or_else(|| ServiceError::NotFound(ORDER_NOT_FOUND.to_string()))?;
                assert_owned(&current, owner_id)?;

                match (current.status, target) {
                    (OrderStatus::Cancelled, _) => {
                        Err(ServiceError::ValidationError(CANCELLED_EDIT.to_string()))
                    }
                    (OrderStatus::Submit, Some(OrderStatus::Draft)) => {
                        Err(ServiceError::ValidationError(SUBMITTED_TO_DRAFT.to_string()))
                    }
                    (OrderStatus::Submit, _) => edit_submitted(txn, current, patch).await,
                    (OrderStatus::Draft, target) => {
                        edit_draft(txn, current, patch, target.unwrap_or(OrderStatus::Draft)).await
                    }
                }
            })
        })
        .await
        .map_err(transaction_error)
    }
}

/// Lines are frozen once submitted: only credit and remarks change, and the
/// credit may not exceed what is still owed after returns.
async fn edit_submitted(
    txn: &DatabaseTransaction,
    current: order::Model,
    patch: UpdateOrderRequest,
) -> Result<(order::Model, Vec<Event>), ServiceError> {
    if patch.products.is_some() || patch.customer.is_some() {
        debug!(order_id = %current.id, "ignoring line and customer changes on submitted order");
    }

    let credit = patch.credit.unwrap_or(current.credit);
    let ordered = OrderRepository::new(txn).lines(current.id).await?;
    let prior = ReturnRepository::new(txn).find_by_order(current.id).await?;
    let returned = lines_total(prior.iter().flat_map(|r| r.lines.iter()))?;
    ensure_credit_within(credit, remaining_total(lines_total(&ordered)?, returned)?)?;

    let order_id = current.id;
    let remarks = patch.remarks.or_else(|| current.remarks.clone());
    let mut active: order::ActiveModel = current.into();
    active.credit = Set(credit);
    active.remarks = Set(remarks);
    active.updated_at = Set(Some(Utc::now()));

    let updated = OrderRepository::new(txn).update(active).await?;
    Ok((updated, vec![Event::OrderUpdated(order_id)]))
}

async fn edit_draft(
    txn: &DatabaseTransaction,
    current: order::Model,
    patch: UpdateOrderRequest,
    target: OrderStatus,
) -> Result<(order::Model, Vec<Event>), ServiceError> {
    let owner_id = current.owner_id;
    let orders = OrderRepository::new(txn);

    if let Some(customer_id) = patch.customer {
        ensure_customer_eligible(txn, owner_id, customer_id).await?;
    }

    let replaced_lines = patch.products.is_some();
    let lines: Vec<OrderLineInput> = match patch.products {
        Some(lines) => lines,
        None => orders
            .lines(current.id)
            .await?
            .iter()
            .map(OrderLineInput::from)
            .collect(),
    };

    // drafts may hold more than is in stock; availability is checked on submit
    let submitting = target == OrderStatus::Submit;
    if submitting {
        ensure_lines_available(txn, owner_id, &lines).await?;
    }

    let credit = patch.credit.unwrap_or(current.credit);
    ensure_credit_within(credit, lines_total(&lines)?)?;

    let order_id = current.id;
    let remarks = patch.remarks.or_else(|| current.remarks.clone());
    let customer_id = patch.customer.unwrap_or(current.customer_id);
    let mut active: order::ActiveModel = current.into();
    active.customer_id = Set(customer_id);
    active.credit = Set(credit);
    active.remarks = Set(remarks);
    active.status = Set(target);
    active.updated_at = Set(Some(Utc::now()));
    let updated = orders.update(active).await?;

    if replaced_lines {
        orders.replace_lines(order_id, &lines).await?;
    }

    let mut events = vec![Event::OrderUpdated(order_id)];
    if submitting {
        let withdrawals = StockLedger::new(txn, owner_id)
            .withdraw_all(&lines)
            .await?;
        events.extend(withdrawals);
        events.push(Event::OrderSubmitted(order_id));
    }

    Ok((updated, events))
}
