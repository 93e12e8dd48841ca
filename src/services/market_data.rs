use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};

use crate::errors::AlarmError;
use crate::models::price_series::{PriceSeries, Quote};

/// Source of price history and latest quotes
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Daily samples from `start` until now. An empty series means no data.
    async fn fetch_history(
        &self,
        symbol: &str,
        start: DateTime<FixedOffset>,
    ) -> Result<PriceSeries, AlarmError>;

    /// Latest price and company name
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, AlarmError>;
}
