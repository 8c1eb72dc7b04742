//! Database access layer
//!
//! Plain SQL per table. Functions take `impl PgExecutor` so they run either
//! on the pool or inside a transaction opened by a service.

pub mod companies;
pub mod dashboard;
pub mod inventory;
pub mod job_cards;
pub mod materials;
pub mod prepress;
pub mod process;
pub mod products;
pub mod purchasing;
pub mod roles;
pub mod users;

use sqlx::PgExecutor;

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Allocate the next document number (`JC-2026-00042`) from a DB sequence
pub async fn next_document_number(
    conn: impl PgExecutor<'_>,
    sequence: DocumentSequence,
) -> Result<String, BoxError> {
    let (seq,): (i64,) = sqlx::query_as(sequence.next_val_sql())
        .fetch_one(conn)
        .await?;
    Ok(shared::util::document_number(
        sequence.prefix(),
        shared::util::current_year(),
        seq,
    ))
}

#[derive(Debug, Clone, Copy)]
pub enum DocumentSequence {
    JobCard,
    PurchaseOrder,
}

impl DocumentSequence {
    fn prefix(self) -> &'static str {
        match self {
            Self::JobCard => "JC",
            Self::PurchaseOrder => "PO",
        }
    }

    fn next_val_sql(self) -> &'static str {
        match self {
            Self::JobCard => "SELECT nextval('job_number_seq')",
            Self::PurchaseOrder => "SELECT nextval('po_number_seq')",
        }
    }
}

/// `SELECT 1` check for the health endpoint
pub async fn ping(conn: impl PgExecutor<'_>) -> Result<(), BoxError> {
    sqlx::query("SELECT 1").execute(conn).await?;
    Ok(())
}
