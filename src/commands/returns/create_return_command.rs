use crate::{
    auth::ownership::assert_owned,
    commands::{transaction_error, with_context, Command},
    db::DbPool,
    entities::{order, purchase_return, DocumentKind, OrderStatus},
    errors::ServiceError,
    events::{Event, EventSender},
    metrics,
    models::CreateReturnRequest,
    repositories::{OrderRepository, ProductRepository, ReturnRepository, ReturnWithLines},
    services::{
        inventory::StockLedger,
        numbering::NumberingService,
        reconciliation::{
            clamp_credit, first_return_exceeded, first_unresolved, lines_total, quantities_by_code,
            remaining_total,
        },
    },
};
use chrono::Utc;
use lazy_static::lazy_static;
use prometheus::{IntCounter, IntCounterVec};
use sea_orm::{Set, TransactionTrait};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

lazy_static! {
    static ref RETURNS_CREATED: IntCounter = metrics::register_counter(
        "purchase_returns_created_total",
        "Total number of purchase returns created"
    );
    static ref CREDIT_CLAMPS: IntCounter = metrics::register_counter(
        "order_credit_clamps_total",
        "Total number of order credits lowered by a purchase return"
    );
    static ref RETURN_CREATION_FAILURES: IntCounterVec = metrics::register_counter_vec(
        "purchase_return_failures_total",
        "Total number of failed purchase returns",
        &["error_type"]
    );
}

const CREATE_FAILED: &str = "Cannot create purchase return information. Please try again later!";
const ORDER_MISSING: &str = "Order does not exists!";
pub(crate) const ORDER_NOT_RETURNABLE: &str =
    "You cannot create purchase return on a drafted or cancelled orders!";
const PRODUCTS_MISSING: &str = "Some products entered have not been created yet!";

/// What a successful return produced: the stored return, the order it was
/// recorded against and that order's credit afterwards.
#[derive(Debug, Clone)]
pub struct ReturnReceipt {
    pub purchase_return: ReturnWithLines,
    pub order: order::Model,
}

/// Records a purchase return against a submitted order, restocks the returned
/// products and lowers the order's credit if it now exceeds what is owed.
#[derive(Debug, Clone)]
pub struct CreateReturnCommand {
    pub owner_id: Uuid,
    pub request: CreateReturnRequest,
}

#[async_trait::async_trait]
impl Command for CreateReturnCommand {
    type Result = ReturnReceipt;

    #[instrument(skip(self, db_pool, event_sender), fields(owner_id = %self.owner_id, po_no = %self.request.order))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let (receipt, events) = self.record(db_pool.as_ref()).await.map_err(|e| {
            RETURN_CREATION_FAILURES
                .with_label_values(&[e.kind()])
                .inc();
            error!(error = %e, "purchase return failed");
            with_context(e, CREATE_FAILED)
        })?;

        for event in events {
            if matches!(event, Event::CreditClamped { .. }) {
                CREDIT_CLAMPS.inc();
            }
            event_sender.send_or_log(event).await;
        }

        RETURNS_CREATED.inc();
        info!(
            prt_no = %receipt.purchase_return.purchase_return.prt_no,
            credit = %receipt.order.credit,
            "purchase return created"
        );

        Ok(receipt)
    }
}

impl CreateReturnCommand {
    async fn record(&self, db: &DbPool) -> Result<(ReturnReceipt, Vec<Event>), ServiceError> {
        let request = self.request.clone().into_normalized()?;
        let owner_id = self.owner_id;

        db.transaction::<_, (ReturnReceipt, Vec<Event>), ServiceError>(|txn| {
            Box::pin(async move {
                let orders = OrderRepository::new(txn);
                let returns = ReturnRepository::new(txn);

                let order = orders
                    .find_by_po_no(owner_id, &request.order)
                    .await?
                    .ok_or_else(|| ServiceError::ValidationError(ORDER_MISSING.to_string()))?;
                assert_owned(&order, owner_id)?;
                if order.status != OrderStatus::Submit {
                    return Err(ServiceError::ValidationError(
                        ORDER_NOT_RETURNABLE.to_string(),
                    ));
                }

                let prior = returns.find_by_order(order.id).await?;
                let prior_lines: Vec<_> = prior.iter().flat_map(|r| r.lines.iter()).collect();
                let already_returned = quantities_by_code(prior_lines.iter().copied());

                let entered = &request.returned_products;
                let codes: Vec<String> = entered.iter().map(|l| l.code.clone()).collect();
                let products = ProductRepository::new(txn)
                    .find_active_by_codes(owner_id, &codes)
                    .await?;
                if let Some(code) = first_unresolved(entered, &products) {
                    warn!(code, "return references unknown product");
                    return Err(ServiceError::ValidationError(PRODUCTS_MISSING.to_string()));
                }

                let ordered_lines = orders.lines(order.id).await?;
                let ordered = quantities_by_code(ordered_lines.iter());
                if let Some(code) = first_return_exceeded(entered, &ordered, &already_returned) {
                    return Err(ServiceError::ReturnExceeded {
                        code: code.to_string(),
                    });
                }

                // what the order still owes once this return is applied
                let previously_returned = lines_total(prior_lines.iter().copied())?;
                let remaining = remaining_total(
                    remaining_total(lines_total(&ordered_lines)?, previously_returned)?,
                    lines_total(entered)?,
                )?;

                let prt_no = NumberingService::allocate(
                    txn,
                    owner_id,
                    DocumentKind::Return,
                    Utc::now().date_naive(),
                )
                .await?;

                let model = purchase_return::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    owner_id: Set(owner_id),
                    prt_no: Set(prt_no.clone()),
                    order_id: Set(order.id),
                    reason: Set(request.reason.clone()),
                    ..Default::default()
                };
                let stored = returns.insert(model, entered).await?;

                let mut events = vec![Event::ReturnCreated {
                    return_id: stored.purchase_return.id,
                    order_id: order.id,
                    prt_no,
                }];

                let restocked = StockLedger::new(txn, owner_id)
                    .restock_all(entered)
                    .await?;
                events.extend(restocked);

                let order = match clamp_credit(order.credit, remaining) {
                    Some(new_credit) => {
                        let order_id = order.id;
                        let old_credit = order.credit;
                        let mut active: order::ActiveModel = order.into();
                        active.credit = Set(new_credit);
                        active.updated_at = Set(Some(Utc::now()));
                        let updated = orders.update(active).await?;

                        info!(%order_id, %old_credit, %new_credit, "order credit clamped");
                        events.push(Event::CreditClamped {
                            order_id,
                            old_credit,
                            new_credit,
                        });
                        updated
                    }
                    None => order,
                };

                Ok((
                    ReturnReceipt {
                        purchase_return: stored,
                        order,
                    },
                    events,
                ))
            })
        })
        .await
        .map_err(transaction_error)
    }
}
