//! Row type for the `market_prices` table.

use chrono::NaiveDateTime;

use crate::config::{GRADE_MAX_CHARS, NAME_MAX_CHARS};
use crate::types::ScoredListing;

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct MarketPriceRow {
    pub collected_at: NaiveDateTime,
    pub name: String,
    pub price: i64,
    pub grade: String,
    pub z_score: f32,
}

impl From<&ScoredListing> for MarketPriceRow {
    fn from(r: &ScoredListing) -> Self {
        Self {
            collected_at: r.collected_at.naive_utc(),
            name: truncate_chars(&r.listing.name, NAME_MAX_CHARS),
            price: r.listing.price.round() as i64,
            grade: truncate_chars(&r.listing.grade, GRADE_MAX_CHARS),
            z_score: r.z_score as f32,
        }
    }
}

/// VARCHAR(n) counts characters under utf8mb4, so cut on char boundaries.
fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((byte_idx, _)) => s[..byte_idx].to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Listing;
    use chrono::{TimeZone, Utc};

    fn scored(name: &str, price: f64, grade: &str, z_score: f64) -> ScoredListing {
        ScoredListing {
            listing: Listing::new(name, price, grade),
            z_score,
            collected_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
        }
    }

    #[test]
    fn maps_scored_listing_to_row() {
        let row = MarketPriceRow::from(&scored("원한 각인서", 1234.6, "전설", -1.75));
        assert_eq!(row.name, "원한 각인서");
        assert_eq!(row.price, 1235);
        assert_eq!(row.grade, "전설");
        assert!((row.z_score - (-1.75f32)).abs() < f32::EPSILON);
        assert_eq!(row.collected_at.to_string(), "2024-05-01 12:30:00");
    }

    #[test]
    fn long_text_is_truncated_to_column_width() {
        let long_name = "가".repeat(NAME_MAX_CHARS + 20);
        let long_grade = "g".repeat(GRADE_MAX_CHARS + 1);
        let row = MarketPriceRow::from(&scored(&long_name, 1.0, &long_grade, 0.0));
        assert_eq!(row.name.chars().count(), NAME_MAX_CHARS);
        assert_eq!(row.grade.chars().count(), GRADE_MAX_CHARS);
    }

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_chars("abc", 5), "abc");
        assert_eq!(truncate_chars("abcde", 5), "abcde");
    }
}
