use crate::{
    auth::ownership::assert_owned,
    commands::{
        orders::{CancelOrderCommand, CreateOrderCommand, UpdateOrderCommand},
        Command,
    },
    db::DbPool,
    entities::{order, order_line_item, OrderStatus},
    errors::ServiceError,
    events::EventSender,
    models::{CreateOrderRequest, UpdateOrderRequest},
    repositories::{OrderRepository, OrderWithLines, ProductRepository, ReturnRepository},
    services::reconciliation::quantities_by_code,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

const ORDER_NOT_FOUND: &str = "Order not found!";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineResponse {
    pub code: String,
    pub name: String,
    pub quantity: i32,
    pub price: Decimal,
    pub cost: Decimal,
    /// Current stock of the product, present on single-order reads
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_quantity: Option<i32>,
}

impl From<&order_line_item::Model> for OrderLineResponse {
    fn from(line: &order_line_item::Model) -> Self {
        Self {
            code: line.code.clone(),
            name: line.name.clone(),
            quantity: line.quantity,
            price: line.price,
            cost: line.cost,
            remaining_quantity: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: Uuid,
    pub po_no: String,
    pub customer: Uuid,
    pub status: OrderStatus,
    pub products: Vec<OrderLineResponse>,
    pub credit: Decimal,
    pub prt_ids: Vec<Uuid>,
    pub remarks: Option<String>,
    pub is_active: bool,
    pub created_date: DateTime<Utc>,
    pub updated_date: Option<DateTime<Utc>>,
}

impl OrderResponse {
    fn build(order: order::Model, lines: &[order_line_item::Model], prt_ids: Vec<Uuid>) -> Self {
        Self {
            id: order.id,
            po_no: order.po_no,
            customer: order.customer_id,
            status: order.status,
            products: lines.iter().map(OrderLineResponse::from).collect(),
            credit: order.credit,
            prt_ids,
            remarks: order.remarks,
            is_active: order.is_active,
            created_date: order.created_at,
            updated_date: order.updated_at,
        }
    }
}

impl From<OrderWithLines> for OrderResponse {
    fn from(created: OrderWithLines) -> Self {
        Self::build(created.order, &created.lines, Vec::new())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnedQuantity {
    pub code: String,
    pub name: String,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnHeader {
    pub id: Uuid,
    pub prt_no: String,
    pub reason: String,
    pub created_date: DateTime<Utc>,
}

/// Every return recorded against one order, with returned quantities
/// aggregated per product code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderReturnsSummary {
    pub order_id: Uuid,
    pub po_no: String,
    pub returns: Vec<ReturnHeader>,
    pub returned_products: Vec<ReturnedQuantity>,
}

#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl OrderService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    pub async fn create_order(
        &self,
        owner_id: Uuid,
        request: CreateOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        let created = CreateOrderCommand { owner_id, request }
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await?;
        Ok(created.into())
    }

    pub async fn update_order(
        &self,
        owner_id: Uuid,
        order_id: Uuid,
        request: UpdateOrderRequest,
    ) -> Result<order::Model, ServiceError> {
        UpdateOrderCommand {
            owner_id,
            order_id,
            request,
        }
        .execute(self.db_pool.clone(), self.event_sender.clone())
        .await
    }

    pub async fn cancel_order(
        &self,
        owner_id: Uuid,
        order_id: Uuid,
    ) -> Result<order::Model, ServiceError> {
        CancelOrderCommand { owner_id, order_id }
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    /// One order with its lines, each annotated with the product's current
    /// stock.
    #[instrument(skip(self))]
    pub async fn get_order(
        &self,
        owner_id: Uuid,
        order_id: Uuid,
    ) -> Result<OrderResponse, ServiceError> {
        let db = self.db_pool.as_ref();
        let order = self.owned_order(owner_id, order_id).await?;

        let lines = OrderRepository::new(db).lines(order.id).await?;
        let prt_ids = ReturnRepository::new(db)
            .find_by_order(order.id)
            .await?
            .into_iter()
            .map(|r| r.purchase_return.id)
            .collect();

        let codes: Vec<String> = lines.iter().map(|l| l.code.clone()).collect();
        let stock: HashMap<String, i32> = ProductRepository::new(db)
            .find_active_by_codes(owner_id, &codes)
            .await?
            .into_iter()
            .map(|p| (p.code, p.quantity))
            .collect();

        let mut response = OrderResponse::build(order, &lines, prt_ids);
        for line in &mut response.products {
            line.remaining_quantity = stock.get(&line.code).copied();
        }
        Ok(response)
    }

    #[instrument(skip(self))]
    pub async fn order_returns(
        &self,
        owner_id: Uuid,
        order_id: Uuid,
    ) -> Result<OrderReturnsSummary, ServiceError> {
        let order = self.owned_order(owner_id, order_id).await?;
        let returns = ReturnRepository::new(self.db_pool.as_ref())
            .find_by_order(order.id)
            .await?;

        let all_lines: Vec<_> = returns.iter().flat_map(|r| r.lines.iter()).collect();
        let totals = quantities_by_code(all_lines.iter().copied());

        // first-seen order of codes, so the summary reads like the returns
        let mut returned_products: Vec<ReturnedQuantity> = Vec::new();
        for line in &all_lines {
            if returned_products.iter().any(|r| r.code == line.code) {
                continue;
            }
            returned_products.push(ReturnedQuantity {
                code: line.code.clone(),
                name: line.name.clone(),
                quantity: totals.get(&line.code).copied().unwrap_or(0),
            });
        }

        Ok(OrderReturnsSummary {
            order_id: order.id,
            po_no: order.po_no,
            returns: returns
                .iter()
                .map(|r| ReturnHeader {
                    id: r.purchase_return.id,
                    prt_no: r.purchase_return.prt_no.clone(),
                    reason: r.purchase_return.reason.clone(),
                    created_date: r.purchase_return.created_at,
                })
                .collect(),
            returned_products,
        })
    }

    async fn owned_order(&self, owner_id: Uuid, order_id: Uuid) -> Result<order::Model, ServiceError> {
        let order = OrderRepository::new(self.db_pool.as_ref())
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(ORDER_NOT_FOUND.to_string()))?;
        assert_owned(&order, owner_id)?;
        Ok(order)
    }
}
