use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use crate::config::ScoringConfig;
use crate::error::ScoreError;
use crate::scorer::stats::BatchStats;
use crate::types::{Listing, ScoredBatch, ScoredListing, SelectionPolicy};

/// Output keys the scorer owns; input fields with these names are not passed through.
const RESERVED_KEYS: &[&str] = &["name", "price", "grade", "z_score", "collected_at", "db_status"];

/// Scores a batch of listings by how far each price sits below the batch mean.
pub struct DealScorer {
    config: ScoringConfig,
}

impl DealScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn policy(&self) -> &SelectionPolicy {
        &self.config.policy
    }

    /// Validates raw decoded records and scores them, stamped with the current time.
    pub fn score_values(&self, values: &[Value]) -> Result<ScoredBatch, ScoreError> {
        let listings = parse_listings(values)?;
        self.score_at(listings, Utc::now())
    }

    /// Scores already-typed listings. Every record gets the same `collected_at`.
    /// Batches below the configured minimum size come back empty.
    pub fn score_at(
        &self,
        listings: Vec<Listing>,
        collected_at: DateTime<Utc>,
    ) -> Result<ScoredBatch, ScoreError> {
        if let Some(index) = listings.iter().position(|l| !l.price.is_finite()) {
            return Err(ScoreError::InvalidPrice { index });
        }
        if listings.is_empty() || listings.len() < self.config.min_batch_size {
            debug!(
                batch_size = listings.len(),
                min_batch_size = self.config.min_batch_size,
                "[SCORER] batch below minimum size, nothing to score"
            );
            return Ok(ScoredBatch::default());
        }

        let prices: Vec<f64> = listings.iter().map(|l| l.price).collect();
        let Some(stats) = BatchStats::from_prices(&prices) else {
            return Ok(ScoredBatch::default());
        };
        debug!(
            batch_size = listings.len(),
            mean = stats.mean,
            std_dev = stats.std_dev.unwrap_or(0.0),
            "[SCORER] batch stats"
        );

        let records = listings
            .into_iter()
            .map(|listing| ScoredListing {
                z_score: stats.z_score(listing.price),
                listing,
                collected_at,
            })
            .collect();

        Ok(ScoredBatch { records })
    }
}

/// Converts decoded JSON records into listings. The first bad record fails the batch.
pub fn parse_listings(values: &[Value]) -> Result<Vec<Listing>, ScoreError> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| parse_listing(index, value))
        .collect()
}

fn parse_listing(index: usize, value: &Value) -> Result<Listing, ScoreError> {
    let Value::Object(fields) = value else {
        return Err(ScoreError::NotAnObject { index });
    };

    let price = match fields.get("price") {
        None => return Err(ScoreError::MissingField { index, field: "price" }),
        Some(Value::Number(n)) => n.as_f64().ok_or(ScoreError::InvalidPrice { index })?,
        Some(_) => return Err(ScoreError::InvalidPrice { index }),
    };

    let extra = fields
        .iter()
        .filter(|(k, _)| !RESERVED_KEYS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    Ok(Listing {
        name: text_field(index, fields.get("name"), "name")?,
        price,
        grade: text_field(index, fields.get("grade"), "grade")?,
        extra,
    })
}

/// Strings pass as-is; numbers and booleans are stringified. Null counts as missing.
fn text_field(index: usize, value: Option<&Value>, field: &'static str) -> Result<String, ScoreError> {
    match value {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => Ok(v.to_string()),
        _ => Err(ScoreError::MissingField { index, field }),
    }
}
