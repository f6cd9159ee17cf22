use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Auction fetch error: {0}")]
    Fetch(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Why a decoded batch could not be scored. Any of these fails the whole batch.
#[derive(Debug, Error, PartialEq)]
pub enum ScoreError {
    #[error("record {index} is not an object")]
    NotAnObject { index: usize },

    #[error("record {index} is missing field '{field}'")]
    MissingField { index: usize, field: &'static str },

    #[error("record {index} has a non-numeric price")]
    InvalidPrice { index: usize },
}

/// Failure of one persist call, tagged with the stage that failed.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("connect failed: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("schema setup failed: {0}")]
    Schema(#[source] sqlx::Error),

    #[error("insert failed: {0}")]
    Insert(#[source] sqlx::Error),

    #[error("commit failed: {0}")]
    Commit(#[source] sqlx::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(raw: &str) -> Result<Vec<serde_json::Value>> {
        Ok(serde_json::from_str(raw)?)
    }

    #[test]
    fn json_failure_converts_into_app_error() {
        let err = decode("not json").unwrap_err();
        assert!(matches!(err, AppError::Json(_)));
        assert!(err.to_string().starts_with("JSON parse error:"));
    }

    #[test]
    fn score_error_names_record_and_field() {
        let err = ScoreError::MissingField { index: 3, field: "price" };
        assert_eq!(err.to_string(), "record 3 is missing field 'price'");
    }
}
