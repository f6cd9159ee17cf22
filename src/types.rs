use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// One marketplace item as handed to the scorer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    pub name: String,
    #[serde(serialize_with = "serialize_price")]
    pub price: f64,
    pub grade: String,
    /// Any other input fields, carried through to the output untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Listing {
    pub fn new(name: impl Into<String>, price: f64, grade: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            price,
            grade: grade.into(),
            extra: Map::new(),
        }
    }
}

/// Whole-number prices are written as integers (`100`, not `100.0`).
fn serialize_price<S: Serializer>(price: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if price.fract() == 0.0 && price.abs() < i64::MAX as f64 {
        serializer.serialize_i64(*price as i64)
    } else {
        serializer.serialize_f64(*price)
    }
}

// ---------------------------------------------------------------------------
// Scored output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredListing {
    #[serde(flatten)]
    pub listing: Listing,
    pub z_score: f64,
    pub collected_at: DateTime<Utc>,
}

/// Every listing of one batch with its z-score, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoredBatch {
    pub records: Vec<ScoredListing>,
}

impl ScoredBatch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Applies `policy` and returns the picked records.
    pub fn select(&self, policy: &SelectionPolicy) -> Vec<ScoredListing> {
        match *policy {
            SelectionPolicy::Threshold(cutoff) => self
                .records
                .iter()
                .filter(|r| r.z_score <= cutoff)
                .cloned()
                .collect(),
            SelectionPolicy::TopN(n) => {
                let mut sorted = self.records.clone();
                // Stable: equal scores keep input order.
                sorted.sort_by(|a, b| a.z_score.total_cmp(&b.z_score));
                sorted.truncate(n);
                sorted
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Selection policy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectionPolicy {
    /// Keep listings with `z_score <= cutoff`, input order.
    Threshold(f64),
    /// Cheapest-relative-to-mean first, at most N.
    TopN(usize),
}

impl std::fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionPolicy::Threshold(cutoff) => write!(f, "threshold(z <= {cutoff})"),
            SelectionPolicy::TopN(n) => write!(f, "top_n({n})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scored(name: &str, z_score: f64) -> ScoredListing {
        ScoredListing {
            listing: Listing::new(name, 100.0, "x"),
            z_score,
            collected_at: Utc::now(),
        }
    }

    fn batch(scores: &[(&str, f64)]) -> ScoredBatch {
        ScoredBatch {
            records: scores.iter().map(|(n, z)| scored(n, *z)).collect(),
        }
    }

    #[test]
    fn threshold_keeps_input_order() {
        let b = batch(&[("a", -2.0), ("b", 0.5), ("c", -1.5), ("d", -1.49)]);
        let picked = b.select(&SelectionPolicy::Threshold(-1.5));
        let names: Vec<_> = picked.iter().map(|r| r.listing.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn top_n_sorts_ascending_and_truncates() {
        let b = batch(&[("a", 0.3), ("b", -1.0), ("c", 2.0), ("d", -0.2), ("e", 0.0), ("f", -3.0)]);
        let picked = b.select(&SelectionPolicy::TopN(5));
        let names: Vec<_> = picked.iter().map(|r| r.listing.name.as_str()).collect();
        assert_eq!(names, vec!["f", "b", "d", "e", "a"]);
    }

    #[test]
    fn top_n_ties_keep_input_order() {
        let b = batch(&[("a", 0.0), ("b", 0.0), ("c", 0.0)]);
        let picked = b.select(&SelectionPolicy::TopN(2));
        let names: Vec<_> = picked.iter().map(|r| r.listing.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn listing_serializes_passthrough_fields_and_integral_price() {
        let mut listing = Listing::new("Grudge", 1200.0, "legendary");
        listing.extra.insert("tier".to_string(), json!(3));
        let value = serde_json::to_value(&listing).unwrap();
        assert_eq!(
            value,
            json!({"name": "Grudge", "price": 1200, "grade": "legendary", "tier": 3})
        );
    }

    #[test]
    fn fractional_price_stays_float() {
        let value = serde_json::to_value(Listing::new("a", 10.5, "x")).unwrap();
        assert_eq!(value["price"], json!(10.5));
    }
}
