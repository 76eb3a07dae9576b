use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event after the owning transaction has committed. The write
    /// already happened, so a closed channel is logged rather than surfaced.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!(error = %e, "domain event dropped");
        }
    }
}

// Domain events emitted after a state change commits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    OrderCreated {
        order_id: Uuid,
        owner_id: Uuid,
        po_no: String,
    },
    OrderUpdated(Uuid),
    OrderSubmitted(Uuid),
    OrderCancelled(Uuid),
    ReturnCreated {
        return_id: Uuid,
        order_id: Uuid,
        prt_no: String,
    },
    StockAdjusted {
        owner_id: Uuid,
        code: String,
        delta: i32,
    },
    CreditClamped {
        order_id: Uuid,
        old_credit: Decimal,
        new_credit: Decimal,
    },
    ProductCreated {
        product_id: Uuid,
        code: String,
    },
    ProductRestocked {
        product_id: Uuid,
        quantity: i32,
    },
    ProductDeactivated(Uuid),
    CustomerCreated {
        customer_id: Uuid,
        customer_no: String,
    },
    CustomerBlacklistChanged {
        customer_id: Uuid,
        is_blacklisted: bool,
    },
}

pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::OrderCreated {
                order_id,
                owner_id,
                po_no,
            } => info!(%order_id, %owner_id, %po_no, "order created"),
            Event::OrderSubmitted(order_id) => info!(%order_id, "order submitted"),
            Event::OrderCancelled(order_id) => info!(%order_id, "order cancelled"),
            Event::ReturnCreated {
                return_id,
                order_id,
                prt_no,
            } => info!(%return_id, %order_id, %prt_no, "purchase return created"),
            Event::StockAdjusted {
                owner_id,
                code,
                delta,
            } => info!(%owner_id, %code, delta, "stock adjusted"),
            Event::CreditClamped {
                order_id,
                old_credit,
                new_credit,
            } => info!(%order_id, %old_credit, %new_credit, "order credit clamped"),
            other => info!(event = ?other, "domain event"),
        }
    }

    info!("Event processing loop stopped");
}
