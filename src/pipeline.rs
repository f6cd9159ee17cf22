//! Decode → score → persist → select, rendered into output records.
//!
//! Every failure is turned into a printable payload here; nothing below this
//! layer decides how an error looks to the caller.

use serde_json::Value;
use tracing::{info, warn};

use crate::db::{persist_status, BatchSink};
use crate::error::Result;
use crate::output::OutputRecord;
use crate::scorer::DealScorer;
use crate::types::{Listing, ScoredBatch};

/// Parses the raw argument into a JSON array of records.
pub fn decode_batch(input: &str) -> Result<Vec<Value>> {
    Ok(serde_json::from_str::<Vec<Value>>(input)?)
}

pub struct Pipeline<S> {
    scorer: DealScorer,
    sink: S,
}

impl<S: BatchSink> Pipeline<S> {
    pub fn new(scorer: DealScorer, sink: S) -> Self {
        Self { scorer, sink }
    }

    /// Runs one invocation's argument through the pipeline. A missing or
    /// undecodable argument yields an empty payload.
    pub async fn run_input(&self, input: Option<&str>) -> Vec<OutputRecord> {
        let Some(input) = input else {
            info!("No input batch given");
            return Vec::new();
        };
        match decode_batch(input) {
            Ok(values) => self.run_values(&values).await,
            Err(e) => {
                warn!("Input decode failed: {e}");
                Vec::new()
            }
        }
    }

    pub async fn run_values(&self, values: &[Value]) -> Vec<OutputRecord> {
        match self.scorer.score_values(values) {
            Ok(batch) => self.finish(batch).await,
            Err(e) => {
                warn!("Scoring failed: {e}");
                vec![OutputRecord::error(e.to_string())]
            }
        }
    }

    /// Entry point for callers that already hold typed listings.
    pub async fn run_listings(&self, listings: Vec<Listing>) -> Vec<OutputRecord> {
        match self.scorer.score_at(listings, chrono::Utc::now()) {
            Ok(batch) => self.finish(batch).await,
            Err(e) => {
                warn!("Scoring failed: {e}");
                vec![OutputRecord::error(e.to_string())]
            }
        }
    }

    async fn finish(&self, batch: ScoredBatch) -> Vec<OutputRecord> {
        if batch.is_empty() {
            return Vec::new();
        }

        let result = self.sink.persist(&batch.records).await;
        let status = persist_status(&result);
        match &result {
            Ok(report) => info!(rows = report.rows, "Persisted scored batch"),
            Err(e) => warn!("Persist failed, returning scores anyway: {e}"),
        }

        let picks = batch.select(self.scorer.policy());
        info!(
            batch_size = batch.len(),
            picked = picks.len(),
            policy = %self.scorer.policy(),
            "Deal selection complete"
        );

        let mut records: Vec<OutputRecord> = picks.into_iter().map(OutputRecord::deal).collect();
        if let Some(OutputRecord::Deal { db_status, .. }) = records.first_mut() {
            *db_status = Some(status);
        }
        records
    }
}
