use crate::{
    auth::ownership::assert_owned,
    commands::{transaction_error, with_context, Command},
    db::DbPool,
    entities::{order, OrderStatus},
    errors::ServiceError,
    events::{Event, EventSender},
    metrics,
    repositories::OrderRepository,
};
use chrono::Utc;
use lazy_static::lazy_static;
use prometheus::{IntCounter, IntCounterVec};
use sea_orm::{Set, TransactionTrait};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

lazy_static! {
    static ref ORDER_CANCELLATIONS: IntCounter = metrics::register_counter(
        "order_cancellations_total",
        "Total number of order cancellations"
    );
    static ref ORDER_CANCELLATION_FAILURES: IntCounterVec = metrics::register_counter_vec(
        "order_cancellation_failures_total",
        "Total number of failed order cancellations",
        &["error_type"]
    );
}

const CANCEL_FAILED: &str = "Cannot cancel order. Please try again later!";
const SUBMITTED_CANCEL: &str = "Cancellation of a submitted order is not allowed!";
const ALREADY_CANCELLED: &str = "This order has already been cancelled!";

/// Cancels a DRAFT order. Drafts never took stock, so nothing is restored.
#[derive(Debug, Clone)]
pub struct CancelOrderCommand {
    pub owner_id: Uuid,
    pub order_id: Uuid,
}

#[async_trait::async_trait]
impl Command for CancelOrderCommand {
    type Result = order::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(owner_id = %self.owner_id, order_id = %self.order_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let cancelled = self.cancel_order_in_db(db_pool.as_ref()).await.map_err(|e| {
            ORDER_CANCELLATION_FAILURES
                .with_label_values(&[e.kind()])
                .inc();
            error!(error = %e, "order cancellation failed");
            with_context(e, CANCEL_FAILED)
        })?;

        event_sender
            .send_or_log(Event::OrderCancelled(cancelled.id))
            .await;
        ORDER_CANCELLATIONS.inc();
        info!(po_no = %cancelled.po_no, "order cancelled");

        Ok(cancelled)
    }
}

impl CancelOrderCommand {
    async fn cancel_order_in_db(&self, db: &DbPool) -> Result<order::Model, ServiceError> {
        let owner_id = self.owner_id;
        let order_id = self.order_id;

        db.transaction::<_, order::Model, ServiceError>(|txn| {
            Box::pin(async move {
                let orders = OrderRepository::new(txn);
                let order = orders
                    .find_by_id(order_id)
                    .await?
                    .ok_or_else(|| ServiceError::NotFound("Order not found!".to_string()))?;
                assert_owned(&order, owner_id)?;

                match order.status {
                    OrderStatus::Submit => {
                        warn!("cancellation of submitted order refused");
                        return Err(ServiceError::ValidationError(SUBMITTED_CANCEL.to_string()));
                    }
                    OrderStatus::Cancelled => {
                        return Err(ServiceError::ValidationError(ALREADY_CANCELLED.to_string()));
                    }
                    OrderStatus::Draft => {}
                }

                let now = Utc::now();
                let mut active: order::ActiveModel = order.into();
                active.status = Set(OrderStatus::Cancelled);
                active.is_active = Set(false);
                active.deactivated_at = Set(Some(now));
                active.updated_at = Set(Some(now));

                Ok(orders.update(active).await?)
            })
        })
        .await
        .map_err(transaction_error)
    }
}
