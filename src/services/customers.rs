use crate::{
    auth::ownership::assert_owned,
    commands::{transaction_error, with_context},
    db::DbPool,
    entities::{customer, DocumentKind},
    errors::ServiceError,
    events::{Event, EventSender},
    models::{BlacklistCustomerRequest, CreateCustomerRequest},
    repositories::CustomerRepository,
    services::numbering::NumberingService,
};
use chrono::{DateTime, Utc};
use sea_orm::{Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerResponse {
    pub id: Uuid,
    pub customer_no: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub is_blacklisted: bool,
    pub is_active: bool,
    pub created_date: DateTime<Utc>,
    pub updated_date: Option<DateTime<Utc>>,
}

impl From<customer::Model> for CustomerResponse {
    fn from(c: customer::Model) -> Self {
        Self {
            id: c.id,
            customer_no: c.customer_no,
            first_name: c.first_name,
            last_name: c.last_name,
            email: c.email,
            is_blacklisted: c.is_blacklisted,
            is_active: c.is_active,
            created_date: c.created_at,
            updated_date: c.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct CustomerService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl CustomerService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Registers a customer under the next CRM number of the owner.
    #[instrument(skip(self, request))]
    pub async fn create_customer(
        &self,
        owner_id: Uuid,
        request: CreateCustomerRequest,
    ) -> Result<CustomerResponse, ServiceError> {
        let request = request.into_normalized()?;

        let created = self
            .db_pool
            .transaction::<_, customer::Model, ServiceError>(|txn| {
                Box::pin(async move {
                    let customer_no = NumberingService::allocate(
                        txn,
                        owner_id,
                        DocumentKind::Customer,
                        Utc::now().date_naive(),
                    )
                    .await?;

                    let model = customer::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        owner_id: Set(owner_id),
                        customer_no: Set(customer_no),
                        first_name: Set(request.first_name),
                        last_name: Set(request.last_name),
                        email: Set(request.email),
                        is_blacklisted: Set(false),
                        is_active: Set(true),
                        ..Default::default()
                    };
                    Ok(CustomerRepository::new(txn).insert(model).await?)
                })
            })
            .await
            .map_err(transaction_error)
            .map_err(|e| {
                with_context(e, "Cannot create customer information. Please try again later!")
            })?;

        self.event_sender
            .send_or_log(Event::CustomerCreated {
                customer_id: created.id,
                customer_no: created.customer_no.clone(),
            })
            .await;
        info!(customer_no = %created.customer_no, "customer created");

        Ok(created.into())
    }

    #[instrument(skip(self))]
    pub async fn set_blacklisted(
        &self,
        owner_id: Uuid,
        customer_id: Uuid,
        request: BlacklistCustomerRequest,
    ) -> Result<CustomerResponse, ServiceError> {
        let customers = CustomerRepository::new(self.db_pool.as_ref());
        let current = customers
            .find_by_id(customer_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Customer not found!".to_string()))?;
        assert_owned(&current, owner_id)?;

        let updated = customers
            .set_blacklisted(current, request.is_blacklisted)
            .await?;
        self.event_sender
            .send_or_log(Event::CustomerBlacklistChanged {
                customer_id,
                is_blacklisted: updated.is_blacklisted,
            })
            .await;

        Ok(updated.into())
    }
}
