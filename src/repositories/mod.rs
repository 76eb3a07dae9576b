//! Owner-scoped data access. Each repository borrows a connection, which may
//! be the pool or an open transaction, so commands can compose several
//! repositories inside one unit of work.

pub mod customer_repository;
pub mod order_repository;
pub mod product_repository;
pub mod return_repository;
pub mod sequence_repository;

pub use customer_repository::CustomerRepository;
pub use order_repository::{OrderRepository, OrderWithLines};
pub use product_repository::ProductRepository;
pub use return_repository::{ReturnRepository, ReturnWithLines};
pub use sequence_repository::SequenceRepository;
