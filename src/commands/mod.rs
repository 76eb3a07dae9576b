use crate::{db::DbPool, errors::ServiceError, events::EventSender};
use async_trait::async_trait;
use sea_orm::TransactionError;
use std::sync::Arc;

pub mod orders;
pub mod returns;

/// A state-changing business operation.
///
/// Each command validates its input, performs all of its writes inside one
/// database transaction and publishes domain events once the transaction has
/// committed.
#[async_trait]
pub trait Command: Send + Sync {
    /// The return type of the command when executed successfully
    type Result;

    /// Execute the command with the given dependencies
    ///
    /// # Arguments
    /// * `db_pool` - Database connection pool for persistence operations
    /// * `event_sender` - Channel to publish domain events
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError>;
}

/// Flattens a failed transaction back into the error that caused it.
pub(crate) fn transaction_error(err: TransactionError<ServiceError>) -> ServiceError {
    match err {
        TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
        TransactionError::Transaction(service_err) => service_err,
    }
}

/// Replaces a raw persistence failure with the operation's user-facing
/// message. Business-rule errors pass through untouched.
pub(crate) fn with_context(err: ServiceError, context: &str) -> ServiceError {
    match err {
        ServiceError::DatabaseError(db_err) => ServiceError::internal(context, db_err),
        other => other,
    }
}
