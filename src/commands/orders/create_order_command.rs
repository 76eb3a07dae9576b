use crate::{
    commands::{transaction_error, with_context, Command},
    db::DbPool,
    entities::{order, DocumentKind, OrderStatus},
    errors::ServiceError,
    events::{Event, EventSender},
    metrics,
    models::CreateOrderRequest,
    repositories::{OrderRepository, OrderWithLines},
    services::{
        inventory::StockLedger, numbering::NumberingService, reconciliation::lines_total,
    },
};
use chrono::Utc;
use lazy_static::lazy_static;
use prometheus::{IntCounter, IntCounterVec};
use sea_orm::{Set, TransactionTrait};
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

use super::{ensure_credit_within, ensure_customer_eligible, ensure_lines_available};

lazy_static! {
    static ref ORDERS_CREATED: IntCounter =
        metrics::register_counter("orders_created_total", "Total number of orders created");
    static ref ORDERS_SUBMITTED_ON_CREATE: IntCounter = metrics::register_counter(
        "orders_submitted_on_create_total",
        "Total number of orders created directly in SUBMIT status"
    );
    static ref ORDER_CREATION_FAILURES: IntCounterVec = metrics::register_counter_vec(
        "order_creation_failures_total",
        "Total number of failed order creations",
        &["error_type"]
    );
}

const CREATE_FAILED: &str = "Cannot create order information. Please try again later!";

/// Creates an order in DRAFT or SUBMIT. A submitted order takes its line
/// quantities out of stock in the same transaction that stores it.
#[derive(Debug, Clone)]
pub struct CreateOrderCommand {
    pub owner_id: Uuid,
    pub request: CreateOrderRequest,
}

#[async_trait::async_trait]
impl Command for CreateOrderCommand {
    type Result = OrderWithLines;

    #[instrument(skip(self, db_pool, event_sender), fields(owner_id = %self.owner_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let result = self.create(db_pool.as_ref()).await;

        let (created, events) = result.map_err(|e| {
            ORDER_CREATION_FAILURES.with_label_values(&[e.kind()]).inc();
            error!(error = %e, "order creation failed");
            with_context(e, CREATE_FAILED)
        })?;

        for event in events {
            event_sender.send_or_log(event).await;
        }

        ORDERS_CREATED.inc();
        if created.order.status == OrderStatus::Submit {
            ORDERS_SUBMITTED_ON_CREATE.inc();
        }
        info!(
            order_id = %created.order.id,
            po_no = %created.order.po_no,
            status = %created.order.status,
            "order created"
        );

        Ok(created)
    }
}

impl CreateOrderCommand {
    async fn create(&self, db: &DbPool) -> Result<(OrderWithLines, Vec<Event>), ServiceError> {
        let request = self.request.clone().into_normalized()?;
        let status = request.entry_status()?;
        let owner_id = self.owner_id;

        db.transaction::<_, (OrderWithLines, Vec<Event>), ServiceError>(|txn| {
            Box::pin(async move {
                ensure_customer_eligible(txn, owner_id, request.customer).await?;
                ensure_lines_available(txn, owner_id, &request.products).await?;
                ensure_credit_within(request.credit, lines_total(&request.products)?)?;

                let po_no = NumberingService::allocate(
                    txn,
                    owner_id,
                    DocumentKind::Order,
                    Utc::now().date_naive(),
                )
                .await?;

                let model = order::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    owner_id: Set(owner_id),
                    po_no: Set(po_no.clone()),
                    customer_id: Set(request.customer),
                    status: Set(status),
                    credit: Set(request.credit),
                    remarks: Set(request.remarks.clone()),
                    is_active: Set(true),
                    deactivated_at: Set(None),
                    ..Default::default()
                };
                let created = OrderRepository::new(txn)
                    .insert(model, &request.products)
                    .await?;

                let mut events = vec![Event::OrderCreated {
                    order_id: created.order.id,
                    owner_id,
                    po_no,
                }];

                if status == OrderStatus::Submit {
                    let withdrawals = StockLedger::new(txn, owner_id)
                        .withdraw_all(&request.products)
                        .await?;
                    events.extend(withdrawals);
                    events.push(Event::OrderSubmitted(created.order.id));
                }

                Ok((created, events))
            })
        })
        .await
        .map_err(transaction_error)
    }
}
