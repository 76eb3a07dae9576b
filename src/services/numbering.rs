//! Period-scoped document numbers of the form `<PREFIX><YYYY><MM>-<NNNN>`.

use chrono::{Datelike, NaiveDate};
use sea_orm::{ConnectionTrait, DbErr, SqlErr};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::{
    entities::DocumentKind,
    errors::ServiceError,
    repositories::{CustomerRepository, OrderRepository, ReturnRepository, SequenceRepository},
};

const SEQUENCE_CONFLICT: &str = "Another document was numbered at the same time. Please try again!";

/// Year, month and counter embedded in a formatted number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Parsed {
    year: i32,
    month: u32,
    counter: u32,
}

fn parse(kind: DocumentKind, number: &str) -> Option<Parsed> {
    let rest = number.strip_prefix(kind.prefix())?;
    let (period, counter) = rest.split_once('-')?;
    if period.len() != 6 || !period.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(Parsed {
        year: period[..4].parse().ok()?,
        month: period[4..].parse().ok()?,
        counter: counter.parse().ok()?,
    })
}

fn format(kind: DocumentKind, year: i32, month: u32, counter: u32) -> String {
    format!("{}{}{:02}-{:04}", kind.prefix(), year, month, counter)
}

/// The number following `previous` on `today`.
///
/// A missing or unreadable previous number, or one from another year or month,
/// starts the current month at `0001`. The counter is zero-padded to four
/// digits and simply grows past `9999`.
pub fn next_number(kind: DocumentKind, previous: Option<&str>, today: NaiveDate) -> String {
    let (year, month) = (today.year(), today.month());

    let counter = match previous.map(|p| (p, parse(kind, p))) {
        Some((_, Some(prev))) if prev.year == year && prev.month == month => prev.counter + 1,
        Some((raw, None)) => {
            warn!(number = raw, prefix = kind.prefix(), "unreadable document number, restarting sequence");
            1
        }
        _ => 1,
    };

    format(kind, year, month, counter)
}

/// Hands out the next number for an owner and document kind.
///
/// The last issued number lives in a counter record. The first allocation for
/// an owner seeds that record from the most recent existing document, so
/// numbering continues across data created before the counter existed.
pub struct NumberingService;

impl NumberingService {
    #[instrument(skip(conn))]
    pub async fn allocate<C: ConnectionTrait>(
        conn: &C,
        owner_id: Uuid,
        kind: DocumentKind,
        today: NaiveDate,
    ) -> Result<String, ServiceError> {
        let sequences = SequenceRepository::new(conn);

        match sequences.find(owner_id, kind).await? {
            Some(sequence) => {
                let next = next_number(kind, Some(&sequence.last_number), today);
                let advanced = sequences
                    .advance(sequence.id, &sequence.last_number, &next)
                    .await?;
                if advanced == 0 {
                    warn!(%owner_id, ?kind, "document counter moved underneath us");
                    return Err(ServiceError::Conflict(SEQUENCE_CONFLICT.to_string()));
                }
                debug!(%owner_id, number = %next, "document number allocated");
                Ok(next)
            }
            None => {
                let latest = Self::latest_document_number(conn, owner_id, kind).await?;
                let next = next_number(kind, latest.as_deref(), today);
                sequences
                    .insert(owner_id, kind, &next)
                    .await
                    .map_err(sequence_insert_error)?;
                debug!(%owner_id, number = %next, "document sequence started");
                Ok(next)
            }
        }
    }

    async fn latest_document_number<C: ConnectionTrait>(
        conn: &C,
        owner_id: Uuid,
        kind: DocumentKind,
    ) -> Result<Option<String>, DbErr> {
        Ok(match kind {
            DocumentKind::Order => OrderRepository::new(conn)
                .find_latest_by_owner(owner_id)
                .await?
                .map(|o| o.po_no),
            DocumentKind::Return => ReturnRepository::new(conn)
                .find_latest_by_owner(owner_id)
                .await?
                .map(|r| r.prt_no),
            DocumentKind::Customer => CustomerRepository::new(conn)
                .find_latest_by_owner(owner_id)
                .await?
                .map(|c| c.customer_no),
        })
    }
}

fn sequence_insert_error(err: DbErr) -> ServiceError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            ServiceError::Conflict(SEQUENCE_CONFLICT.to_string())
        }
        _ => ServiceError::DatabaseError(err),
    }
}
