use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};

use crate::errors::AlarmError;
use crate::models::alarm::NOT_AVAILABLE;
use crate::models::chart::{ChartResponse, ChartResult};
use crate::models::price_series::{normalize_timestamp, timestamp_from_epoch, PriceSeries, Quote};
use crate::services::market_data::MarketDataProvider;

const YAHOO_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const USER_AGENT: &str = "Mozilla/5.0 (compatible; stalarm/0.1)";

#[derive(Clone)]
pub struct YahooClient {
    client: reqwest::Client,
}

impl YahooClient {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client })
    }

    /// Fetch the chart for a symbol with the given query parameters
    async fn fetch_chart(
        &self,
        symbol: &str,
        query: &[(&str, String)],
    ) -> Result<ChartResult, AlarmError> {
        let url = chart_url(symbol)?;

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| AlarmError::Upstream(e.to_string()))?;

        let status = response.status();
        let body = match response.json::<ChartResponse>().await {
            Ok(body) => body,
            Err(_) if status == reqwest::StatusCode::NOT_FOUND => {
                return Err(AlarmError::UnknownSymbol(symbol.to_string()));
            }
            Err(e) => return Err(AlarmError::Upstream(e.to_string())),
        };

        body.chart.into_result(symbol)
    }
}

#[async_trait]
impl MarketDataProvider for YahooClient {
    async fn fetch_history(
        &self,
        symbol: &str,
        start: DateTime<FixedOffset>,
    ) -> Result<PriceSeries, AlarmError> {
        let query = [
            ("period1", start.timestamp().to_string()),
            ("period2", Utc::now().timestamp().to_string()),
            ("interval", "1d".to_string()),
        ];

        let result = self.fetch_chart(symbol, &query).await?;
        let series = result.to_series();

        if series.is_empty() {
            tracing::debug!("No daily samples for {} since {}", symbol, start);
        } else {
            tracing::debug!("Fetched {} daily samples for {}", series.len(), symbol);
        }
        Ok(series)
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, AlarmError> {
        let query = [
            ("range", "1d".to_string()),
            ("interval", "1d".to_string()),
        ];

        let result = self.fetch_chart(symbol, &query).await?;
        quote_from_chart(symbol, &result)
    }
}

fn chart_url(symbol: &str) -> Result<reqwest::Url, AlarmError> {
    let mut url =
        reqwest::Url::parse(YAHOO_CHART_URL).map_err(|e| AlarmError::Upstream(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| AlarmError::Upstream("chart url cannot take a symbol".to_string()))?
        .push(symbol);
    Ok(url)
}

/// Latest price from chart metadata. A missing market time means the quote is current.
fn quote_from_chart(symbol: &str, result: &ChartResult) -> Result<Quote, AlarmError> {
    let price = result
        .meta
        .regular_market_price
        .filter(|p| p.is_finite())
        .ok_or_else(|| AlarmError::QuoteUnavailable(symbol.to_string()))?;

    let gmtoffset = result.meta.gmtoffset;
    let timestamp = result
        .meta
        .regular_market_time
        .and_then(|secs| timestamp_from_epoch(secs, gmtoffset))
        .unwrap_or_else(|| {
            normalize_timestamp(
                Utc::now().naive_utc(),
                gmtoffset.and_then(FixedOffset::east_opt),
            )
        });

    Ok(Quote {
        company_name: result.company_name().unwrap_or(NOT_AVAILABLE).to_string(),
        price,
        timestamp,
    })
}
