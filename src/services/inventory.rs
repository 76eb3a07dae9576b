use sea_orm::ConnectionTrait;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    errors::ServiceError, events::Event, repositories::ProductRepository,
    services::reconciliation::PricedLine,
};

/// Applies signed quantity changes to an owner's products. Runs against
/// whatever connection it is given, normally the caller's open transaction,
/// so a failed line rolls back the lines applied before it.
pub struct StockLedger<'a, C> {
    conn: &'a C,
    owner_id: Uuid,
}

impl<'a, C: ConnectionTrait> StockLedger<'a, C> {
    pub fn new(conn: &'a C, owner_id: Uuid) -> Self {
        Self { conn, owner_id }
    }

    /// `quantity += delta` on the active product with this code.
    pub async fn adjust_stock(&self, code: &str, delta: i32) -> Result<Event, ServiceError> {
        let touched = ProductRepository::new(self.conn)
            .inc_quantity(self.owner_id, code, delta)
            .await?;

        if touched == 0 {
            warn!(owner_id = %self.owner_id, code, "stock adjustment on unknown product");
            return Err(ServiceError::NotFound(format!("Product {} not found", code)));
        }

        debug!(owner_id = %self.owner_id, code, delta, "stock adjusted");
        Ok(self.adjusted(code, delta))
    }

    /// Takes `quantity` units out of stock, refusing to go below zero. A
    /// concurrent withdrawal that got there first is reported the same way as
    /// an order that asked for too much.
    pub async fn withdraw(&self, code: &str, quantity: i32) -> Result<Event, ServiceError> {
        let touched = ProductRepository::new(self.conn)
            .withdraw(self.owner_id, code, quantity)
            .await?;

        if touched == 0 {
            warn!(owner_id = %self.owner_id, code, quantity, "stock withdrawal refused");
            return Err(ServiceError::StockExceeded {
                code: code.to_string(),
            });
        }

        debug!(owner_id = %self.owner_id, code, quantity, "stock withdrawn");
        Ok(self.adjusted(code, -quantity))
    }

    /// Withdraws every line in order. Stops at the first refusal.
    pub async fn withdraw_all<L: PricedLine + Sync>(
        &self,
        lines: &[L],
    ) -> Result<Vec<Event>, ServiceError> {
        let mut events = Vec::with_capacity(lines.len());
        for line in lines {
            events.push(self.withdraw(line.code(), line.quantity()).await?);
        }
        Ok(events)
    }

    /// Puts every line back into stock, in order.
    pub async fn restock_all<L: PricedLine + Sync>(
        &self,
        lines: &[L],
    ) -> Result<Vec<Event>, ServiceError> {
        let mut events = Vec::with_capacity(lines.len());
        for line in lines {
            events.push(self.adjust_stock(line.code(), line.quantity()).await?);
        }
        Ok(events)
    }

    fn adjusted(&self, code: &str, delta: i32) -> Event {
        Event::StockAdjusted {
            owner_id: self.owner_id,
            code: code.to_string(),
            delta,
        }
    }
}
