use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;
use serde::Serialize;
use utoipa::ToSchema;

use crate::business_logic::config::MonitoringConfig;

pub const NOT_AVAILABLE: &str = "N/A";

const YAHOO_QUOTE_URL: &str = "https://finance.yahoo.com/quote";

/// Column headers in display order. Matches the serialized keys of [`AlarmRow`].
pub const ALARM_COLUMNS: [&str; 14] = [
    "Company name",
    "Symbol",
    "Actual start date",
    "Opening price",
    "Lowest price",
    "Lowest price time",
    "Highest price",
    "Highest price time",
    "Latest price",
    "Latest price time",
    "Dec. lim.",
    "Dec. lim. reached",
    "Inc. lim.",
    "Inc. lim. reached after dec. lim. reached",
];

/// Evaluation result for one symbol.
///
/// Either every price and timestamp is populated, or the record is degraded:
/// "N/A" company name, zero prices, no timestamps and both flags false.
#[derive(Debug, Clone, PartialEq)]
pub struct AlarmRecord {
    pub company_name: String,
    pub symbol: String,
    pub effective_start: Option<DateTime<FixedOffset>>,
    pub opening_price: f64,
    pub lowest_price: f64,
    pub lowest_price_at: Option<DateTime<FixedOffset>>,
    pub highest_price: f64,
    pub highest_price_at: Option<DateTime<FixedOffset>>,
    pub latest_price: f64,
    pub latest_price_at: Option<DateTime<FixedOffset>>,
    pub decrease_limit_label: String,
    pub decrease_limit_reached: bool,
    pub increase_limit_label: String,
    pub increase_after_decrease_limit_reached: bool,
}

impl AlarmRecord {
    /// Sentinel record for a symbol whose data could not be obtained or processed
    pub fn degraded(symbol: &str, config: &MonitoringConfig) -> Self {
        Self {
            company_name: NOT_AVAILABLE.to_string(),
            symbol: symbol.to_string(),
            effective_start: None,
            opening_price: 0.0,
            lowest_price: 0.0,
            lowest_price_at: None,
            highest_price: 0.0,
            highest_price_at: None,
            latest_price: 0.0,
            latest_price_at: None,
            decrease_limit_label: config.decrease_limit_label(),
            decrease_limit_reached: false,
            increase_limit_label: config.increase_limit_label(),
            increase_after_decrease_limit_reached: false,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.effective_start.is_none()
    }
}

/// Display row for one symbol. Timestamps are pre-formatted in the display time zone.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AlarmRow {
    #[serde(rename = "Company name")]
    #[schema(rename = "Company name")]
    pub company_name: String,
    #[serde(rename = "Symbol")]
    #[schema(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "Actual start date")]
    #[schema(rename = "Actual start date")]
    pub actual_start_date: Option<String>,
    #[serde(rename = "Opening price")]
    #[schema(rename = "Opening price")]
    pub opening_price: f64,
    #[serde(rename = "Lowest price")]
    #[schema(rename = "Lowest price")]
    pub lowest_price: f64,
    #[serde(rename = "Lowest price time")]
    #[schema(rename = "Lowest price time")]
    pub lowest_price_time: Option<String>,
    #[serde(rename = "Highest price")]
    #[schema(rename = "Highest price")]
    pub highest_price: f64,
    #[serde(rename = "Highest price time")]
    #[schema(rename = "Highest price time")]
    pub highest_price_time: Option<String>,
    #[serde(rename = "Latest price")]
    #[schema(rename = "Latest price")]
    pub latest_price: f64,
    #[serde(rename = "Latest price time")]
    #[schema(rename = "Latest price time")]
    pub latest_price_time: Option<String>,
    #[serde(rename = "Dec. lim.")]
    #[schema(rename = "Dec. lim.")]
    pub decrease_limit: String,
    #[serde(rename = "Dec. lim. reached")]
    #[schema(rename = "Dec. lim. reached")]
    pub decrease_limit_reached: bool,
    #[serde(rename = "Inc. lim.")]
    #[schema(rename = "Inc. lim.")]
    pub increase_limit: String,
    #[serde(rename = "Inc. lim. reached after dec. lim. reached")]
    #[schema(rename = "Inc. lim. reached after dec. lim. reached")]
    pub increase_after_decrease_limit_reached: bool,
    /// Quote page for the symbol
    pub url: String,
    /// Row should be rendered as an alarm (decrease limit reached)
    pub highlight: bool,
    /// Row is a degraded placeholder for a symbol that failed
    pub degraded: bool,
}

impl AlarmRow {
    pub fn from_record(record: &AlarmRecord, display_tz: Tz) -> Self {
        let display =
            |ts: Option<DateTime<FixedOffset>>| ts.map(|ts| format_display_time(ts, display_tz));

        Self {
            company_name: record.company_name.clone(),
            symbol: record.symbol.clone(),
            actual_start_date: display(record.effective_start),
            opening_price: record.opening_price,
            lowest_price: record.lowest_price,
            lowest_price_time: display(record.lowest_price_at),
            highest_price: record.highest_price,
            highest_price_time: display(record.highest_price_at),
            latest_price: record.latest_price,
            latest_price_time: display(record.latest_price_at),
            decrease_limit: record.decrease_limit_label.clone(),
            decrease_limit_reached: record.decrease_limit_reached,
            increase_limit: record.increase_limit_label.clone(),
            increase_after_decrease_limit_reached: record.increase_after_decrease_limit_reached,
            url: format!("{YAHOO_QUOTE_URL}/{}", record.symbol),
            highlight: record.decrease_limit_reached,
            degraded: record.is_degraded(),
        }
    }
}

/// Ranked rows of one evaluation run
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AlarmReport {
    pub as_of_ms: u64,
    pub columns: Vec<String>,
    pub rows: Vec<AlarmRow>,
}

impl AlarmReport {
    pub fn new(as_of_ms: u64, records: &[AlarmRecord], display_tz: Tz) -> Self {
        Self {
            as_of_ms,
            columns: ALARM_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: records
                .iter()
                .map(|record| AlarmRow::from_record(record, display_tz))
                .collect(),
        }
    }
}

/// `YY-MM-DD, HH:MM` local time in the given zone, daylight saving included
pub fn format_display_time(ts: DateTime<FixedOffset>, display_tz: Tz) -> String {
    ts.with_timezone(&display_tz)
        .format("%y-%m-%d, %H:%M")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::price_series::timestamp_from_epoch;
    use chrono_tz::Europe::Stockholm;

    fn config() -> MonitoringConfig {
        MonitoringConfig {
            symbols: vec!["ERIC-B.ST".to_string()],
            decrease_limit_pct: 5.0,
            increase_after_decrease_limit_pct: 10.5,
            requested_start: timestamp_from_epoch(1_742_515_200, None).unwrap(),
            price_decimals: 2,
        }
    }

    #[test]
    fn degraded_record_keeps_limit_labels() {
        let record = AlarmRecord::degraded("NOPE", &config());

        assert!(record.is_degraded());
        assert_eq!(record.company_name, "N/A");
        assert_eq!(record.decrease_limit_label, "5.0 %");
        assert_eq!(record.increase_limit_label, "10.5 %");
        assert!(!record.decrease_limit_reached);
        assert!(!record.increase_after_decrease_limit_reached);
    }

    #[test]
    fn format_display_time_follows_daylight_saving() {
        // 2025-03-21 08:00Z, Stockholm on CET
        let winter = timestamp_from_epoch(1_742_544_000, None).unwrap();
        assert_eq!(format_display_time(winter, Stockholm), "25-03-21, 09:00");

        // 2025-07-01 07:00Z, Stockholm on CEST
        let summer = timestamp_from_epoch(1_751_353_200, None).unwrap();
        assert_eq!(format_display_time(summer, Stockholm), "25-07-01, 09:00");

        // Exchange offset on the input does not leak into the display
        let summer_at_exchange = timestamp_from_epoch(1_751_353_200, Some(-14_400)).unwrap();
        assert_eq!(format_display_time(summer_at_exchange, Stockholm), "25-07-01, 09:00");
    }

    #[test]
    fn row_serializes_with_column_headers() {
        let record = AlarmRecord::degraded("NOPE", &config());
        let report = AlarmReport::new(1, &[record], chrono_tz::UTC);
        let value = serde_json::to_value(&report).unwrap();
        let row = value["rows"][0].as_object().unwrap();

        for column in ALARM_COLUMNS {
            assert!(row.contains_key(column), "missing column: {}", column);
        }
        assert!(row["Lowest price time"].is_null());
        assert_eq!(row["url"], "https://finance.yahoo.com/quote/NOPE");
        assert_eq!(row["degraded"], true);
        assert_eq!(report.columns.len(), ALARM_COLUMNS.len());
    }
}
