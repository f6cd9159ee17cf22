pub mod models;
pub mod writer;

pub use writer::MarketPriceWriter;

use crate::config::MARKET_PRICES_TABLE;
use crate::error::PersistError;
use crate::types::ScoredListing;

/// Outcome of a successful persist call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistReport {
    pub rows: usize,
}

/// Destination for a scored batch. Implementations write every record and
/// either commit all of them or none.
#[allow(async_fn_in_trait)]
pub trait BatchSink {
    async fn persist(&self, records: &[ScoredListing]) -> Result<PersistReport, PersistError>;
}

/// Human-readable persist outcome, attached to the output as `db_status`.
pub fn persist_status(result: &Result<PersistReport, PersistError>) -> String {
    match result {
        Ok(report) => format!("Saved {} rows to {MARKET_PRICES_TABLE}", report.rows),
        Err(e) => format!("DB save failed: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_status_names_row_count() {
        let status = persist_status(&Ok(PersistReport { rows: 12 }));
        assert_eq!(status, "Saved 12 rows to market_prices");
    }

    #[test]
    fn failure_status_carries_error_message() {
        let err = PersistError::Connect(sqlx::Error::Protocol("handshake rejected".to_string()));
        let status = persist_status(&Err(err));
        assert!(status.starts_with("DB save failed: connect failed:"));
        assert!(status.contains("handshake rejected"));
    }
}
