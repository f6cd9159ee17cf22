use crate::error::{AppError, Result};
use crate::output::OutputEncoding;
use crate::types::SelectionPolicy;

pub const LOSTARK_API_URL: &str = "https://developer-lostark.game.onstove.com/auctions/items";

/// Target table for scored batches.
pub const MARKET_PRICES_TABLE: &str = "market_prices";

/// Connection charset. Fixed: item names routinely carry 4-byte characters.
pub const DB_CHARSET: &str = "utf8mb4";

pub const DEFAULT_DB_PORT: u16 = 3306;

/// Default selection knobs.
pub const DEFAULT_Z_THRESHOLD: f64 = -1.5;
pub const DEFAULT_TOP_N: usize = 5;
pub const DEFAULT_MIN_BATCH_SIZE: usize = 1;

/// Column widths of `market_prices`; longer values are truncated before insert.
pub const NAME_MAX_CHARS: usize = 100;
pub const GRADE_MAX_CHARS: usize = 50;

/// Rows per multi-row INSERT. 5 binds per row keeps each statement far below
/// the MySQL placeholder limit of 65535.
pub const INSERT_CHUNK_ROWS: usize = 1000;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub output_encoding: OutputEncoding,
    pub db: DbConfig,
    pub scoring: ScoringConfig,
    pub auction: AuctionConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DbConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub port: u16,
    pub charset: &'static str,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            user: "root".to_string(),
            password: String::new(),
            database: "market".to_string(),
            port: DEFAULT_DB_PORT,
            charset: DB_CHARSET,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    pub policy: SelectionPolicy,
    /// Batches smaller than this score as empty (DEAL_MIN_BATCH_SIZE).
    pub min_batch_size: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            policy: SelectionPolicy::TopN(DEFAULT_TOP_N),
            min_batch_size: DEFAULT_MIN_BATCH_SIZE,
        }
    }
}

/// Auction-house search used by the `auction-watch` binary.
#[derive(Debug, Clone)]
pub struct AuctionConfig {
    pub api_url: String,
    /// LOSTARK_API_KEY; only required when actually fetching.
    pub api_key: Option<String>,
    pub category_code: u32,
    pub item_tier: u32,
    pub item_grade: String,
    pub item_name: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so parsing can be
    /// exercised without touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let db_defaults = DbConfig::default();
        let db = DbConfig {
            host: var("DB_HOST", db_defaults.host.as_str()),
            user: var("DB_USER", db_defaults.user.as_str()),
            password: var("DB_PASSWORD", db_defaults.password.as_str()),
            database: var("DB_NAME", db_defaults.database.as_str()),
            port: var("DB_PORT", DEFAULT_DB_PORT.to_string().as_str())
                .parse::<u16>()
                .map_err(|_| AppError::Config("DB_PORT must be a valid port number".to_string()))?,
            charset: DB_CHARSET,
        };

        let threshold = var("DEAL_Z_THRESHOLD", DEFAULT_Z_THRESHOLD.to_string().as_str())
            .parse::<f64>()
            .ok()
            .filter(|t| t.is_finite())
            .ok_or_else(|| AppError::Config("DEAL_Z_THRESHOLD must be a finite number".to_string()))?;
        let top_n = var("DEAL_TOP_N", DEFAULT_TOP_N.to_string().as_str())
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| AppError::Config("DEAL_TOP_N must be a positive integer".to_string()))?;
        let policy = match var("DEAL_SELECTION", "top_n").trim().to_ascii_lowercase().as_str() {
            "top_n" | "topn" => SelectionPolicy::TopN(top_n),
            "threshold" => SelectionPolicy::Threshold(threshold),
            other => {
                return Err(AppError::Config(format!(
                    "DEAL_SELECTION must be 'top_n' or 'threshold', got '{other}'"
                )))
            }
        };
        let scoring = ScoringConfig {
            policy,
            min_batch_size: var("DEAL_MIN_BATCH_SIZE", DEFAULT_MIN_BATCH_SIZE.to_string().as_str())
                .parse::<usize>()
                .map_err(|_| {
                    AppError::Config("DEAL_MIN_BATCH_SIZE must be a non-negative integer".to_string())
                })?,
        };

        let output_encoding = var("OUTPUT_ENCODING", "utf8").parse::<OutputEncoding>()?;

        let auction = AuctionConfig {
            api_url: var("LOSTARK_API_URL", LOSTARK_API_URL),
            api_key: lookup("LOSTARK_API_KEY").filter(|k| !k.trim().is_empty()),
            category_code: var("AUCTION_CATEGORY_CODE", "40000")
                .parse::<u32>()
                .map_err(|_| AppError::Config("AUCTION_CATEGORY_CODE must be an integer".to_string()))?,
            item_tier: var("AUCTION_ITEM_TIER", "3")
                .parse::<u32>()
                .map_err(|_| AppError::Config("AUCTION_ITEM_TIER must be an integer".to_string()))?,
            item_grade: var("AUCTION_ITEM_GRADE", "전설"),
            item_name: var("AUCTION_ITEM_NAME", "원한"),
        };

        Ok(Self {
            log_level: var("LOG_LEVEL", "info"),
            output_encoding,
            db,
            scoring,
            auction,
        })
    }
}
