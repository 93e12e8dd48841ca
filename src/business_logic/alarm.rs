use chrono::{DateTime, FixedOffset};

use crate::business_logic::config::MonitoringConfig;
use crate::errors::AlarmError;
use crate::models::alarm::AlarmRecord;
use crate::models::price_series::{PriceSeries, Quote};

/// Opening price and extremes over the observation window
#[derive(Debug, Clone, PartialEq)]
pub struct Extrema {
    pub opening: f64,
    pub low: f64,
    pub low_at: DateTime<FixedOffset>,
    pub high: f64,
    pub high_at: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub decrease_reached: bool,
    pub increase_after_decrease_reached: bool,
}

/// Aligns the requested start with the series: the exact timestamp if present,
/// else the next later one, else the last sample.
pub fn resolve_start(
    series: &PriceSeries,
    requested: DateTime<FixedOffset>,
) -> Result<DateTime<FixedOffset>, AlarmError> {
    let samples = series.samples();
    let last = samples.last().ok_or(AlarmError::NoHistoricalData)?;

    let idx = samples.partition_point(|s| s.timestamp < requested);
    match samples.get(idx) {
        Some(sample) => Ok(sample.timestamp),
        None => Ok(last.timestamp),
    }
}

/// Opening price at `effective_start` plus the lowest low and highest high from
/// there to the end of the series. Ties resolve to the earliest sample.
pub fn extract_extrema(
    series: &PriceSeries,
    effective_start: DateTime<FixedOffset>,
) -> Result<Extrema, AlarmError> {
    let samples = series.samples();
    let start = samples
        .iter()
        .position(|s| s.timestamp == effective_start)
        .ok_or(AlarmError::NoDataAtWindow(effective_start))?;

    let window = &samples[start..];
    let first = window.first().ok_or(AlarmError::EmptyWindow)?;

    let mut extrema = Extrema {
        opening: first.open,
        low: first.low,
        low_at: first.timestamp,
        high: first.high,
        high_at: first.timestamp,
    };

    for sample in &window[1..] {
        if sample.low < extrema.low {
            extrema.low = sample.low;
            extrema.low_at = sample.timestamp;
        }
        if sample.high > extrema.high {
            extrema.high = sample.high;
            extrema.high_at = sample.timestamp;
        }
    }

    Ok(extrema)
}

pub fn ensure_opening_price(opening: f64) -> Result<f64, AlarmError> {
    if opening > 0.0 {
        Ok(opening)
    } else {
        Err(AlarmError::InvalidOpeningPrice(opening))
    }
}

/// Evaluates both alarm conditions. `opening` must be positive.
///
/// The decrease ratio divides the drop by 100 twice before comparing against
/// `decrease_pct / 100`; this matches the established alarm behaviour and is kept as is.
pub fn evaluate_thresholds(
    opening: f64,
    low: f64,
    latest: f64,
    decrease_pct: f64,
    increase_pct: f64,
) -> Thresholds {
    let decrease_reached =
        low < opening && (((opening - low) / 100.0) / opening) * 100.0 > decrease_pct / 100.0;

    let increase_after_decrease_reached =
        latest > low * (1.0 + increase_pct / 100.0) && decrease_reached;

    Thresholds {
        decrease_reached,
        increase_after_decrease_reached,
    }
}

/// Runs resolve, extract and evaluate for one symbol and assembles its record.
/// Prices are rounded only here, after all comparisons.
pub fn evaluate_symbol(
    config: &MonitoringConfig,
    symbol: &str,
    quote: &Quote,
    series: &PriceSeries,
) -> Result<AlarmRecord, AlarmError> {
    let effective_start = resolve_start(series, config.requested_start)?;
    let extrema = extract_extrema(series, effective_start)?;
    let opening = ensure_opening_price(extrema.opening)?;

    let thresholds = evaluate_thresholds(
        opening,
        extrema.low,
        quote.price,
        config.decrease_limit_pct,
        config.increase_after_decrease_limit_pct,
    );

    let decimals = config.price_decimals;
    Ok(AlarmRecord {
        company_name: quote.company_name.clone(),
        symbol: symbol.to_string(),
        effective_start: Some(effective_start),
        opening_price: round_price(opening, decimals),
        lowest_price: round_price(extrema.low, decimals),
        lowest_price_at: Some(extrema.low_at),
        highest_price: round_price(extrema.high, decimals),
        highest_price_at: Some(extrema.high_at),
        latest_price: round_price(quote.price, decimals),
        latest_price_at: Some(quote.timestamp),
        decrease_limit_label: config.decrease_limit_label(),
        decrease_limit_reached: thresholds.decrease_reached,
        increase_limit_label: config.increase_limit_label(),
        increase_after_decrease_limit_reached: thresholds.increase_after_decrease_reached,
    })
}

/// Halves go to the even digit
pub fn round_price(price: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (price * factor).round_ties_even() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::price_series::{timestamp_from_epoch, PriceSample};

    const DAY: i64 = 86_400;
    const START: i64 = 1_742_544_000;

    fn ts(day: i64) -> DateTime<FixedOffset> {
        timestamp_from_epoch(START + day * DAY, Some(3600)).unwrap()
    }

    fn sample(day: i64, open: f64, high: f64, low: f64) -> PriceSample {
        PriceSample {
            timestamp: ts(day),
            open,
            high,
            low,
        }
    }

    fn series() -> PriceSeries {
        PriceSeries::new(vec![
            sample(0, 100.0, 102.0, 98.0),
            sample(1, 99.0, 101.0, 90.0),
            sample(3, 91.0, 95.0, 85.0),
            sample(4, 86.0, 97.5, 85.0),
            sample(7, 96.0, 97.5, 94.0),
        ])
    }

    fn config(requested_start: DateTime<FixedOffset>) -> MonitoringConfig {
        MonitoringConfig {
            symbols: vec!["ERIC-B.ST".to_string()],
            decrease_limit_pct: 5.0,
            increase_after_decrease_limit_pct: 10.0,
            requested_start,
            price_decimals: 2,
        }
    }

    #[test]
    fn resolve_start_returns_exact_match() {
        assert_eq!(resolve_start(&series(), ts(3)).unwrap(), ts(3));
    }

    #[test]
    fn resolve_start_moves_to_next_available_date() {
        assert_eq!(resolve_start(&series(), ts(2)).unwrap(), ts(3));
        assert_eq!(resolve_start(&series(), ts(-5)).unwrap(), ts(0));
    }

    #[test]
    fn resolve_start_falls_back_to_latest_sample() {
        assert_eq!(resolve_start(&series(), ts(30)).unwrap(), ts(7));
    }

    #[test]
    fn resolve_start_matches_instant_across_offsets() {
        let utc = timestamp_from_epoch(START + 3 * DAY, None).unwrap();
        assert_eq!(resolve_start(&series(), utc).unwrap(), ts(3));
    }

    #[test]
    fn resolve_start_rejects_empty_series() {
        let error = resolve_start(&PriceSeries::default(), ts(0)).unwrap_err();
        assert_eq!(error, AlarmError::NoHistoricalData);
    }

    #[test]
    fn extract_extrema_uses_window_from_start() {
        let extrema = extract_extrema(&series(), ts(1)).unwrap();

        assert_eq!(extrema.opening, 99.0);
        assert_eq!(extrema.low, 85.0);
        assert_eq!(extrema.low_at, ts(3));
        assert_eq!(extrema.high, 101.0);
        assert_eq!(extrema.high_at, ts(1));
    }

    #[test]
    fn extract_extrema_breaks_ties_by_earliest_sample() {
        let extrema = extract_extrema(&series(), ts(3)).unwrap();

        assert_eq!(extrema.low_at, ts(3));
        assert_eq!(extrema.high, 97.5);
        assert_eq!(extrema.high_at, ts(4));
    }

    #[test]
    fn extract_extrema_single_sample_window() {
        let series = PriceSeries::new(vec![sample(0, 50.0, 50.0, 50.0)]);
        let extrema = extract_extrema(&series, ts(0)).unwrap();

        assert_eq!(extrema.opening, extrema.low);
        assert_eq!(extrema.low, extrema.high);
        assert_eq!(extrema.low_at, ts(0));
        assert_eq!(extrema.high_at, ts(0));
    }

    #[test]
    fn extract_extrema_rejects_start_outside_series() {
        let error = extract_extrema(&series(), ts(2)).unwrap_err();
        assert_eq!(error, AlarmError::NoDataAtWindow(ts(2)));
    }

    #[test]
    fn evaluate_thresholds_flags_drop_and_recovery() {
        let thresholds = evaluate_thresholds(100.0, 80.0, 95.0, 5.0, 10.0);

        assert!(thresholds.decrease_reached);
        assert!(thresholds.increase_after_decrease_reached);
    }

    #[test]
    fn evaluate_thresholds_requires_low_below_opening() {
        let thresholds = evaluate_thresholds(100.0, 120.0, 130.0, 5.0, 10.0);

        assert!(!thresholds.decrease_reached);
        assert!(!thresholds.increase_after_decrease_reached);
    }

    #[test]
    fn evaluate_thresholds_compares_against_scaled_ratio() {
        // 3% drop: ratio 0.03 is below 10/100 but above 2/100
        assert!(!evaluate_thresholds(100.0, 97.0, 97.0, 10.0, 10.0).decrease_reached);
        assert!(evaluate_thresholds(100.0, 97.0, 97.0, 2.0, 10.0).decrease_reached);
    }

    #[test]
    fn evaluate_thresholds_needs_recovery_above_limit() {
        let thresholds = evaluate_thresholds(100.0, 80.0, 88.0, 5.0, 10.0);

        assert!(thresholds.decrease_reached);
        assert!(!thresholds.increase_after_decrease_reached);
    }

    #[test]
    fn ensure_opening_price_rejects_zero_and_negative() {
        assert_eq!(ensure_opening_price(0.0), Err(AlarmError::InvalidOpeningPrice(0.0)));
        assert!(ensure_opening_price(-1.0).is_err());
        assert_eq!(ensure_opening_price(12.5), Ok(12.5));
    }

    #[test]
    fn evaluate_symbol_assembles_rounded_record() {
        let quote = Quote {
            company_name: "Ericsson".to_string(),
            price: 96.456,
            timestamp: ts(8),
        };

        let record = evaluate_symbol(&config(ts(2)), "ERIC-B.ST", &quote, &series()).unwrap();

        assert_eq!(record.company_name, "Ericsson");
        assert_eq!(record.effective_start, Some(ts(3)));
        assert_eq!(record.opening_price, 91.0);
        assert_eq!(record.lowest_price, 85.0);
        assert_eq!(record.lowest_price_at, Some(ts(3)));
        assert_eq!(record.highest_price_at, Some(ts(4)));
        assert_eq!(record.latest_price, 96.46);
        assert_eq!(record.latest_price_at, Some(ts(8)));
        assert_eq!(record.decrease_limit_label, "5.0 %");
        assert!(record.decrease_limit_reached);
        assert!(record.increase_after_decrease_limit_reached);
        assert!(!record.is_degraded());
    }

    #[test]
    fn evaluate_symbol_rejects_zero_opening() {
        let series = PriceSeries::new(vec![sample(0, 0.0, 1.0, 0.0)]);
        let quote = Quote {
            company_name: "Zero".to_string(),
            price: 1.0,
            timestamp: ts(1),
        };

        let error = evaluate_symbol(&config(ts(0)), "ZERO", &quote, &series).unwrap_err();
        assert_eq!(error, AlarmError::InvalidOpeningPrice(0.0));
    }

    #[test]
    fn round_price_keeps_configured_decimals() {
        assert_eq!(round_price(12.3456, 2), 12.35);
        assert_eq!(round_price(12.3456, 0), 12.0);
    }

    #[test]
    fn round_price_sends_halves_to_even() {
        assert_eq!(round_price(0.125, 2), 0.12);
        assert_eq!(round_price(0.375, 2), 0.38);
        assert_eq!(round_price(2.5, 0), 2.0);
        assert_eq!(round_price(3.5, 0), 4.0);
    }
}
