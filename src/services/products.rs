use crate::{
    auth::ownership::assert_owned,
    commands::{transaction_error, with_context},
    db::DbPool,
    entities::product,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{CreateProductRequest, RestockProductRequest},
    repositories::ProductRepository,
    services::inventory::StockLedger,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

const PRODUCT_NOT_FOUND: &str = "Product not found!";
const DUPLICATE_CODE: &str = "A product with this code already exists!";
const PRODUCT_IN_USE: &str = "Cannot delete this product since there are order/s using this";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub price: Decimal,
    pub cost: Decimal,
    pub quantity: i32,
    pub is_active: bool,
    pub created_date: DateTime<Utc>,
    pub updated_date: Option<DateTime<Utc>>,
}

impl From<product::Model> for ProductResponse {
    fn from(p: product::Model) -> Self {
        Self {
            id: p.id,
            code: p.code,
            name: p.name,
            category: p.category,
            unit: p.unit,
            price: p.price,
            cost: p.cost,
            quantity: p.quantity,
            is_active: p.is_active,
            created_date: p.created_at,
            updated_date: p.updated_at,
        }
    }
}

/// Product catalog operations the order core depends on.
#[derive(Clone)]
pub struct ProductService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl ProductService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, request))]
    pub async fn create_product(
        &self,
        owner_id: Uuid,
        request: CreateProductRequest,
    ) -> Result<ProductResponse, ServiceError> {
        let request = request.into_normalized()?;
        let products = ProductRepository::new(self.db_pool.as_ref());

        if products.find_by_code(owner_id, &request.code).await?.is_some() {
            return Err(ServiceError::Conflict(DUPLICATE_CODE.to_string()));
        }

        let created = products
            .insert(product::ActiveModel {
                id: Set(Uuid::new_v4()),
                owner_id: Set(owner_id),
                code: Set(request.code),
                name: Set(request.name),
                category: Set(request.category),
                unit: Set(request.unit),
                price: Set(request.price),
                cost: Set(request.cost),
                quantity: Set(request.quantity),
                is_active: Set(true),
                ..Default::default()
            })
            .await
            .map_err(|e| {
                with_context(e.into(), "Cannot create product information. Please try again later!")
            })?;

        self.event_sender
            .send_or_log(Event::ProductCreated {
                product_id: created.id,
                code: created.code.clone(),
            })
            .await;
        info!(product_id = %created.id, code = %created.code, "product created");

        Ok(created.into())
    }

    /// Sets the stock of a product to an absolute count. The change goes
    /// through the stock ledger as a single signed adjustment.
    #[instrument(skip(self))]
    pub async fn restock(
        &self,
        owner_id: Uuid,
        product_id: Uuid,
        request: RestockProductRequest,
    ) -> Result<ProductResponse, ServiceError> {
        request.validate()?;
        let quantity = request.quantity;

        let (updated, adjustment) = self
            .db_pool
            .transaction::<_, (product::Model, Option<Event>), ServiceError>(|txn| {
                Box::pin(async move {
                    let products = ProductRepository::new(txn);
                    let current = products
                        .find_by_id(product_id)
                        .await?
                        .filter(|p| p.is_active)
                        .ok_or_else(|| ServiceError::NotFound(PRODUCT_NOT_FOUND.to_string()))?;
                    assert_owned(&current, owner_id)?;

                    let delta = quantity - current.quantity;
                    if delta == 0 {
                        return Ok((current, None));
                    }

                    let event = StockLedger::new(txn, owner_id)
                        .adjust_stock(&current.code, delta)
                        .await?;
                    let updated = products
                        .find_by_id(product_id)
                        .await?
                        .ok_or_else(|| ServiceError::NotFound(PRODUCT_NOT_FOUND.to_string()))?;
                    Ok((updated, Some(event)))
                })
            })
            .await
            .map_err(transaction_error)
            .map_err(|e| with_context(e, "Cannot update product stock. Please try again later!"))?;

        if let Some(event) = adjustment {
            self.event_sender.send_or_log(event).await;
        }
        self.event_sender
            .send_or_log(Event::ProductRestocked {
                product_id,
                quantity: updated.quantity,
            })
            .await;

        Ok(updated.into())
    }

    /// Soft-deletes a product. Products still named by any order line stay.
    #[instrument(skip(self))]
    pub async fn deactivate(&self, owner_id: Uuid, product_id: Uuid) -> Result<(), ServiceError> {
        let products = ProductRepository::new(self.db_pool.as_ref());
        let current = products
            .find_by_id(product_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| ServiceError::NotFound(PRODUCT_NOT_FOUND.to_string()))?;
        assert_owned(&current, owner_id)?;

        if products.has_order_references(owner_id, &current.code).await? {
            warn!(code = %current.code, "product delete refused, still referenced");
            return Err(ServiceError::ValidationError(PRODUCT_IN_USE.to_string()));
        }

        products.deactivate(current).await?;
        self.event_sender
            .send_or_log(Event::ProductDeactivated(product_id))
            .await;
        Ok(())
    }
}
