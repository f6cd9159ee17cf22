use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::AuctionConfig;
use crate::error::{AppError, Result};
use crate::types::Listing;

/// Search body for the auction-house items endpoint. Cheapest buyout first.
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct AuctionSearch {
    pub sort: &'static str,
    pub category_code: u32,
    pub item_tier: u32,
    pub item_grade: String,
    pub item_name: String,
    pub page_no: u32,
    pub sort_condition: &'static str,
}

impl AuctionSearch {
    pub fn from_config(cfg: &AuctionConfig) -> Self {
        Self {
            sort: "BUY_PRICE",
            category_code: cfg.category_code,
            item_tier: cfg.item_tier,
            item_grade: cfg.item_grade.clone(),
            item_name: cfg.item_name.clone(),
            page_no: 0,
            sort_condition: "ASC",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AuctionResponse {
    #[serde(default)]
    items: Option<Vec<AuctionItem>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AuctionItem {
    name: String,
    grade: String,
    auction_info: AuctionInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AuctionInfo {
    #[serde(default)]
    start_price: Option<i64>,
    #[serde(default)]
    buy_price: Option<i64>,
}

impl AuctionItem {
    /// Buyout price when one is set, otherwise the bid start price.
    fn into_listing(self) -> Option<Listing> {
        let price = self
            .auction_info
            .buy_price
            .filter(|p| *p > 0)
            .or(self.auction_info.start_price)?;
        Some(Listing::new(self.name, price as f64, self.grade))
    }
}

/// Fetch current auction listings matching the configured search.
/// Returns an empty vec when the API reports no items.
pub async fn fetch_listings(cfg: &AuctionConfig) -> Result<Vec<Listing>> {
    let api_key = cfg
        .api_key
        .as_deref()
        .ok_or_else(|| AppError::Config("LOSTARK_API_KEY is not set".to_string()))?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;

    let search = AuctionSearch::from_config(cfg);
    info!(
        item = %search.item_name,
        grade = %search.item_grade,
        "Requesting auction listings"
    );

    let resp = client
        .post(&cfg.api_url)
        .header("authorization", format!("bearer {api_key}"))
        .json(&search)
        .send()
        .await?;

    match resp.status() {
        StatusCode::UNAUTHORIZED => {
            return Err(AppError::Fetch(
                "API key rejected (401): check LOSTARK_API_KEY in .env".to_string(),
            ))
        }
        status if !status.is_success() => {
            return Err(AppError::Fetch(format!("auction API returned {status}")))
        }
        _ => {}
    }

    let body = resp.text().await?;
    parse_listings(&body)
}

fn parse_listings(body: &str) -> Result<Vec<Listing>> {
    let parsed: AuctionResponse = serde_json::from_str(body)?;
    let items = parsed.items.unwrap_or_default();
    let total = items.len();

    let listings: Vec<Listing> = items.into_iter().filter_map(AuctionItem::into_listing).collect();
    if listings.len() < total {
        debug!(
            dropped = total - listings.len(),
            "Auction items without any price were skipped"
        );
    }
    Ok(listings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn auction_config() -> AuctionConfig {
        AuctionConfig {
            api_url: "http://127.0.0.1:1/auctions/items".to_string(),
            api_key: None,
            category_code: 40000,
            item_tier: 3,
            item_grade: "전설".to_string(),
            item_name: "원한".to_string(),
        }
    }

    #[test]
    fn search_body_uses_api_field_names() {
        let body = serde_json::to_value(AuctionSearch::from_config(&auction_config())).unwrap();
        assert_eq!(
            body,
            json!({
                "Sort": "BUY_PRICE",
                "CategoryCode": 40000,
                "ItemTier": 3,
                "ItemGrade": "전설",
                "ItemName": "원한",
                "PageNo": 0,
                "SortCondition": "ASC"
            })
        );
    }

    #[test]
    fn buy_price_preferred_over_start_price() {
        let raw = r#"{"PageNo":0,"Items":[
            {"Name":"원한 각인서","Grade":"전설","Tier":3,"AuctionInfo":{"StartPrice":900,"BuyPrice":1200}},
            {"Name":"원한 각인서","Grade":"전설","Tier":3,"AuctionInfo":{"StartPrice":800,"BuyPrice":null}},
            {"Name":"원한 각인서","Grade":"전설","Tier":3,"AuctionInfo":{"StartPrice":700,"BuyPrice":0}}
        ]}"#;
        let listings = parse_listings(raw).unwrap();
        let prices: Vec<f64> = listings.iter().map(|l| l.price).collect();
        assert_eq!(prices, vec![1200.0, 800.0, 700.0]);
        assert_eq!(listings[0].grade, "전설");
    }

    #[test]
    fn items_without_price_are_skipped() {
        let raw = r#"{"Items":[{"Name":"a","Grade":"g","AuctionInfo":{}}]}"#;
        assert!(parse_listings(raw).unwrap().is_empty());
    }

    #[test]
    fn null_items_means_no_listings() {
        assert!(parse_listings(r#"{"Items":null}"#).unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_api_key_is_a_config_error() {
        let err = fetch_listings(&auction_config()).await.unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
