pub mod deal_scorer;
pub mod stats;

pub use deal_scorer::DealScorer;
