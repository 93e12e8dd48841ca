use serde::Deserialize;

use crate::errors::AlarmError;
use crate::models::price_series::{timestamp_from_epoch, PriceSample, PriceSeries};

/// Body of the Yahoo Finance v8 chart endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ChartResponse {
    pub chart: ChartEnvelope,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartEnvelope {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    #[serde(default)]
    pub error: Option<ChartError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartError {
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartResult {
    pub meta: ChartMeta,
    /// Sample open times (epoch seconds); absent when the range has no data
    #[serde(default)]
    pub timestamp: Vec<i64>,
    #[serde(default)]
    pub indicators: Indicators,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    #[serde(default)]
    pub long_name: Option<String>,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub regular_market_price: Option<f64>,
    /// Epoch seconds of the latest price
    #[serde(default)]
    pub regular_market_time: Option<i64>,
    /// Exchange offset from UTC in seconds
    #[serde(default)]
    pub gmtoffset: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<QuoteIndicator>,
}

/// OHLC columns; Yahoo reports gaps as nulls
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuoteIndicator {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
}

impl ChartEnvelope {
    pub fn into_result(self, symbol: &str) -> Result<ChartResult, AlarmError> {
        if let Some(error) = self.error {
            if error.code == "Not Found" {
                return Err(AlarmError::UnknownSymbol(symbol.to_string()));
            }
            return Err(AlarmError::Upstream(
                error.description.unwrap_or(error.code),
            ));
        }

        self.result
            .and_then(|results| results.into_iter().next())
            .ok_or(AlarmError::NoHistoricalData)
    }
}

impl ChartResult {
    /// Samples with a missing or non-finite open, high or low are dropped.
    pub fn to_series(&self) -> PriceSeries {
        let Some(quote) = self.indicators.quote.first() else {
            return PriceSeries::default();
        };

        let samples = self
            .timestamp
            .iter()
            .enumerate()
            .filter_map(|(i, &secs)| {
                let open = finite(quote.open.get(i).copied().flatten())?;
                let high = finite(quote.high.get(i).copied().flatten())?;
                let low = finite(quote.low.get(i).copied().flatten())?;
                let timestamp = timestamp_from_epoch(secs, self.meta.gmtoffset)?;
                Some(PriceSample {
                    timestamp,
                    open,
                    high,
                    low,
                })
            })
            .collect();

        PriceSeries::new(samples)
    }

    pub fn company_name(&self) -> Option<&str> {
        self.meta
            .long_name
            .as_deref()
            .or(self.meta.short_name.as_deref())
    }
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}
