pub mod common;
pub mod customers;
pub mod orders;
pub mod products;
pub mod returns;

use crate::{
    db::DbPool,
    events::EventSender,
    services::{CustomerService, OrderService, ProductService, ReturnService},
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub orders: Arc<OrderService>,
    pub returns: Arc<ReturnService>,
    pub products: Arc<ProductService>,
    pub customers: Arc<CustomerService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            orders: Arc::new(OrderService::new(db_pool.clone(), event_sender.clone())),
            returns: Arc::new(ReturnService::new(db_pool.clone(), event_sender.clone())),
            products: Arc::new(ProductService::new(db_pool.clone(), event_sender.clone())),
            customers: Arc::new(CustomerService::new(db_pool, event_sender)),
        }
    }
}
