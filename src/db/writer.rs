use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{ConnectOptions, Connection, MySql, QueryBuilder};
use tracing::{info, warn};

use crate::config::{DbConfig, INSERT_CHUNK_ROWS, MARKET_PRICES_TABLE};
use crate::db::models::MarketPriceRow;
use crate::db::{BatchSink, PersistReport};
use crate::error::PersistError;
use crate::types::ScoredListing;

/// Writes scored batches to MySQL. Opens a fresh connection per call and
/// closes it before returning, whatever the outcome.
pub struct MarketPriceWriter {
    options: MySqlConnectOptions,
}

impl MarketPriceWriter {
    pub fn new(cfg: &DbConfig) -> Self {
        let options = MySqlConnectOptions::new()
            .host(&cfg.host)
            .port(cfg.port)
            .username(&cfg.user)
            .password(&cfg.password)
            .database(&cfg.database)
            .charset(cfg.charset);
        Self { options }
    }

    pub async fn write_batch(&self, records: &[ScoredListing]) -> Result<PersistReport, PersistError> {
        let mut conn = self.options.connect().await.map_err(PersistError::Connect)?;

        let outcome = write_rows(&mut conn, records).await;

        if let Err(e) = conn.close().await {
            warn!("DB close error: {e}");
        }
        outcome
    }
}

impl BatchSink for MarketPriceWriter {
    async fn persist(&self, records: &[ScoredListing]) -> Result<PersistReport, PersistError> {
        self.write_batch(records).await
    }
}

fn create_table_sql() -> String {
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS {MARKET_PRICES_TABLE} (
            id INT AUTO_INCREMENT PRIMARY KEY,
            collected_at DATETIME,
            name VARCHAR(100),
            price INT,
            grade VARCHAR(50),
            z_score FLOAT
        ) DEFAULT CHARSET = utf8mb4
        "#
    )
}

/// Creates the table if needed, then inserts every row in one transaction.
/// Append-only: nothing here updates or deletes.
async fn write_rows(
    conn: &mut MySqlConnection,
    records: &[ScoredListing],
) -> Result<PersistReport, PersistError> {
    sqlx::query(&create_table_sql())
        .execute(&mut *conn)
        .await
        .map_err(PersistError::Schema)?;

    let rows: Vec<MarketPriceRow> = records.iter().map(MarketPriceRow::from).collect();

    let mut tx = conn.begin().await.map_err(PersistError::Insert)?;
    for chunk in rows.chunks(INSERT_CHUNK_ROWS) {
        let mut builder: QueryBuilder<MySql> = QueryBuilder::new(format!(
            "INSERT INTO {MARKET_PRICES_TABLE} (collected_at, name, price, grade, z_score) "
        ));
        builder.push_values(chunk, |mut b, row| {
            b.push_bind(row.collected_at)
                .push_bind(row.name.clone())
                .push_bind(row.price)
                .push_bind(row.grade.clone())
                .push_bind(row.z_score);
        });
        builder
            .build()
            .execute(&mut *tx)
            .await
            .map_err(PersistError::Insert)?;
    }
    tx.commit().await.map_err(PersistError::Commit)?;

    info!(rows = rows.len(), "[DB] committed batch to {MARKET_PRICES_TABLE}");
    Ok(PersistReport { rows: rows.len() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Listing;
    use chrono::Utc;

    fn unreachable_db() -> DbConfig {
        // Port 1 on loopback: nothing listens there, so connect is refused fast.
        DbConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            ..DbConfig::default()
        }
    }

    #[test]
    fn schema_matches_market_prices_layout() {
        let sql = create_table_sql();
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS market_prices"));
        for column in [
            "id INT AUTO_INCREMENT PRIMARY KEY",
            "collected_at DATETIME",
            "name VARCHAR(100)",
            "price INT",
            "grade VARCHAR(50)",
            "z_score FLOAT",
        ] {
            assert!(sql.contains(column), "missing column definition: {column}");
        }
    }

    #[tokio::test]
    async fn connect_failure_is_reported_not_raised() {
        let writer = MarketPriceWriter::new(&unreachable_db());
        let records = vec![ScoredListing {
            listing: Listing::new("a", 1.0, "x"),
            z_score: 0.0,
            collected_at: Utc::now(),
        }];
        let err = writer.persist(&records).await.unwrap_err();
        assert!(matches!(err, PersistError::Connect(_)));
    }
}
