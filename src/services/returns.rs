use crate::{
    auth::ownership::assert_owned,
    commands::{
        returns::{
            create_return_command::ORDER_NOT_RETURNABLE,
            CreateReturnCommand, ReturnReceipt,
        },
        Command,
    },
    db::DbPool,
    entities::{return_line_item, OrderStatus},
    errors::ServiceError,
    events::EventSender,
    models::CreateReturnRequest,
    repositories::{OrderRepository, ReturnRepository, ReturnWithLines},
    services::reconciliation::{quantities_by_code, returnable_quantity},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

const ORDER_LOOKUP_MISSING: &str = "This order does not exists!";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnLineResponse {
    pub code: String,
    pub name: String,
    pub quantity: i32,
    pub price: Decimal,
}

impl From<&return_line_item::Model> for ReturnLineResponse {
    fn from(line: &return_line_item::Model) -> Self {
        Self {
            code: line.code.clone(),
            name: line.name.clone(),
            quantity: line.quantity,
            price: line.price,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnResponse {
    pub id: Uuid,
    pub prt_no: String,
    /// PO number of the order returned against
    pub order: String,
    pub returned_products: Vec<ReturnLineResponse>,
    pub reason: String,
    /// Order credit after this return was applied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_credit: Option<Decimal>,
    pub created_date: DateTime<Utc>,
}

impl ReturnResponse {
    fn build(stored: ReturnWithLines, po_no: String, order_credit: Option<Decimal>) -> Self {
        Self {
            id: stored.purchase_return.id,
            prt_no: stored.purchase_return.prt_no,
            order: po_no,
            returned_products: stored.lines.iter().map(ReturnLineResponse::from).collect(),
            reason: stored.purchase_return.reason,
            order_credit,
            created_date: stored.purchase_return.created_at,
        }
    }
}

impl From<ReturnReceipt> for ReturnResponse {
    fn from(receipt: ReturnReceipt) -> Self {
        Self::build(
            receipt.purchase_return,
            receipt.order.po_no,
            Some(receipt.order.credit),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnableLine {
    pub code: String,
    pub name: String,
    pub price: Decimal,
    pub ordered_quantity: i32,
    pub returned_quantity: i32,
    pub returnable_quantity: i32,
}

/// A submitted order as seen by someone preparing a return against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnableOrder {
    pub id: Uuid,
    pub po_no: String,
    pub customer: Uuid,
    pub credit: Decimal,
    pub products: Vec<ReturnableLine>,
}

#[derive(Clone)]
pub struct ReturnService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl ReturnService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    pub async fn create_return(
        &self,
        owner_id: Uuid,
        request: CreateReturnRequest,
    ) -> Result<ReturnResponse, ServiceError> {
        let receipt = CreateReturnCommand { owner_id, request }
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await?;
        Ok(receipt.into())
    }

    #[instrument(skip(self))]
    pub async fn get_return(
        &self,
        owner_id: Uuid,
        return_id: Uuid,
    ) -> Result<ReturnResponse, ServiceError> {
        let db = self.db_pool.as_ref();
        let stored = ReturnRepository::new(db)
            .find_by_id(return_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Purchase return not found!".to_string()))?;
        assert_owned(&stored.purchase_return, owner_id)?;

        let po_no = OrderRepository::new(db)
            .find_by_id(stored.purchase_return.order_id)
            .await?
            .map(|o| o.po_no)
            .unwrap_or_default();

        Ok(ReturnResponse::build(stored, po_no, None))
    }

    /// Lines of a submitted order with how many units of each can still be
    /// returned.
    #[instrument(skip(self))]
    pub async fn returnable_order(
        &self,
        owner_id: Uuid,
        po_no: &str,
    ) -> Result<ReturnableOrder, ServiceError> {
        let db = self.db_pool.as_ref();
        let orders = OrderRepository::new(db);

        let order = orders
            .find_by_po_no(owner_id, po_no.trim())
            .await?
            .ok_or_else(|| ServiceError::ValidationError(ORDER_LOOKUP_MISSING.to_string()))?;
        assert_owned(&order, owner_id)?;
        if order.status != OrderStatus::Submit {
            return Err(ServiceError::ValidationError(
                ORDER_NOT_RETURNABLE.to_string(),
            ));
        }

        let prior = ReturnRepository::new(db).find_by_order(order.id).await?;
        let returned = quantities_by_code(prior.iter().flat_map(|r| r.lines.iter()));

        let products = orders
            .lines(order.id)
            .await?
            .into_iter()
            .map(|line| {
                let returned_quantity = returned.get(&line.code).copied().unwrap_or(0);
                ReturnableLine {
                    returnable_quantity: returnable_quantity(line.quantity, returned_quantity),
                    ordered_quantity: line.quantity,
                    returned_quantity,
                    code: line.code,
                    name: line.name,
                    price: line.price,
                }
            })
            .collect();

        Ok(ReturnableOrder {
            id: order.id,
            po_no: order.po_no,
            customer: order.customer_id,
            credit: order.credit,
            products,
        })
    }
}
