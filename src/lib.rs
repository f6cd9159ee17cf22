pub mod config;
pub mod db;
pub mod error;
pub mod fetcher;
pub mod output;
pub mod pipeline;
pub mod scorer;
pub mod types;
