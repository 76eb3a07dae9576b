pub mod customer;
pub mod document_sequence;
pub mod order;
pub mod order_line_item;
pub mod product;
pub mod purchase_return;
pub mod return_line_item;

pub use document_sequence::DocumentKind;
pub use order::OrderStatus;
