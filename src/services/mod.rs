//! Business services. The order and return services front the transactional
//! commands and own the read paths; the catalog services cover the products
//! and customers the core depends on.

pub mod customers;
pub mod inventory;
pub mod numbering;
pub mod orders;
pub mod products;
pub mod reconciliation;
pub mod returns;

pub use customers::CustomerService;
pub use orders::OrderService;
pub use products::ProductService;
pub use returns::ReturnService;
