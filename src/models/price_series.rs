use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};

/// One daily OHLC sample
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSample {
    pub timestamp: DateTime<FixedOffset>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
}

/// Historical samples for one symbol, ascending and strictly increasing by timestamp.
///
/// An empty series is valid and means the provider had no data for the window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    samples: Vec<PriceSample>,
}

impl PriceSeries {
    /// Builds a series, ordering samples by timestamp and keeping the first
    /// sample seen for any repeated timestamp.
    pub fn new(mut samples: Vec<PriceSample>) -> Self {
        samples.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        samples.dedup_by(|later, earlier| later.timestamp == earlier.timestamp);
        Self { samples }
    }

    pub fn samples(&self) -> &[PriceSample] {
        &self.samples
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }
}

/// Latest price observation for a symbol, read independently of the history.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub company_name: String,
    pub price: f64,
    pub timestamp: DateTime<FixedOffset>,
}

/// Attaches an offset to a UTC wall-clock time. Timestamps without a known
/// offset are treated as UTC.
///
/// Every timestamp entering the engine goes through here.
pub fn normalize_timestamp(utc: NaiveDateTime, offset: Option<FixedOffset>) -> DateTime<FixedOffset> {
    let offset = offset.unwrap_or_else(|| Utc.fix());
    offset.from_utc_datetime(&utc)
}

/// Epoch seconds plus an optional GMT offset in seconds, as market data feeds report them.
pub fn timestamp_from_epoch(secs: i64, gmt_offset_secs: Option<i32>) -> Option<DateTime<FixedOffset>> {
    let utc = DateTime::from_timestamp(secs, 0)?.naive_utc();
    let offset = gmt_offset_secs.and_then(FixedOffset::east_opt);
    Some(normalize_timestamp(utc, offset))
}
