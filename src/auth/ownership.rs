use crate::{
    entities::{customer, order, product, purchase_return},
    errors::ServiceError,
};
use uuid::Uuid;

/// Entities scoped to exactly one store owner.
pub trait Owned {
    fn owner_id(&self) -> Uuid;
}

impl Owned for product::Model {
    fn owner_id(&self) -> Uuid {
        self.owner_id
    }
}

impl Owned for customer::Model {
    fn owner_id(&self) -> Uuid {
        self.owner_id
    }
}

impl Owned for order::Model {
    fn owner_id(&self) -> Uuid {
        self.owner_id
    }
}

impl Owned for purchase_return::Model {
    fn owner_id(&self) -> Uuid {
        self.owner_id
    }
}

/// Single authorization gate applied before any read-by-id or mutation.
pub fn assert_owned<T: Owned>(entity: &T, owner_id: Uuid) -> Result<(), ServiceError> {
    if entity.owner_id() == owner_id {
        Ok(())
    } else {
        tracing::warn!(
            owner_id = %owner_id,
            entity_owner = %entity.owner_id(),
            "cross-tenant access rejected"
        );
        Err(ServiceError::Unauthorized("Unauthorized access!".to_string()))
    }
}
