use std::sync::Arc;

use chrono_tz::Tz;
use tokio::sync::Mutex;
use tokio::time::{interval, Duration, Interval, MissedTickBehavior};

use crate::business_logic::alarm::evaluate_symbol;
use crate::business_logic::config::MonitoringConfig;
use crate::business_logic::ranking::rank;
use crate::errors::AlarmError;
use crate::models::alarm::{AlarmRecord, AlarmReport};
use crate::services::alarm_state::SharedAlarmState;
use crate::services::market_data::MarketDataProvider;

const LOOKUP_URL: &str = "https://finance.yahoo.com/lookup/";

/// Evaluates every configured symbol and publishes the ranked result
pub struct MonitorService {
    provider: Arc<dyn MarketDataProvider>,
    config: Arc<MonitoringConfig>,
    display_tz: Tz,
    shared_state: SharedAlarmState,
    /// Held across evaluate and publish so the periodic run and manual
    /// refreshes cannot publish out of order
    refresh_lock: Mutex<()>,
}

impl MonitorService {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        config: Arc<MonitoringConfig>,
        display_tz: Tz,
        shared_state: SharedAlarmState,
    ) -> Self {
        Self {
            provider,
            config,
            display_tz,
            shared_state,
            refresh_lock: Mutex::new(()),
        }
    }

    /// One record per configured symbol, ranked. Never fails as a whole:
    /// a symbol that cannot be evaluated yields a degraded record.
    pub async fn evaluate_all(&self) -> Vec<AlarmRecord> {
        let mut records = Vec::with_capacity(self.config.symbols.len());

        for symbol in &self.config.symbols {
            let record = match self.process_symbol(symbol).await {
                Ok(record) => {
                    Self::log_alarm(&record);
                    record
                }
                Err(e) => {
                    tracing::warn!(
                        "Error fetching data for {}: {}. Is this symbol correct? Check at {}",
                        symbol,
                        e,
                        LOOKUP_URL
                    );
                    AlarmRecord::degraded(symbol, &self.config)
                }
            };
            records.push(record);
        }

        rank(records)
    }

    async fn process_symbol(&self, symbol: &str) -> Result<AlarmRecord, AlarmError> {
        let quote = self.provider.fetch_quote(symbol).await?;
        let series = self
            .provider
            .fetch_history(symbol, self.config.requested_start)
            .await?;

        evaluate_symbol(&self.config, symbol, &quote, &series)
    }

    /// Run an evaluation now and publish it to the shared state
    pub async fn refresh(&self) -> AlarmReport {
        let _guard = self.refresh_lock.lock().await;

        let records = self.evaluate_all().await;
        let as_of_ms = chrono::Utc::now().timestamp_millis() as u64;
        let report = AlarmReport::new(as_of_ms, &records, self.display_tz);

        let degraded = records.iter().filter(|r| r.is_degraded()).count();
        let alarms = records.iter().filter(|r| r.decrease_limit_reached).count();
        tracing::info!(
            "Evaluated {} symbols: {} alarms, {} unavailable",
            records.len(),
            alarms,
            degraded
        );

        let mut state = self.shared_state.report.write().await;
        *state = Some(report.clone());
        let _ = self.shared_state.broadcaster.send(report.clone());

        report
    }

    /// Re-evaluate on a fixed period. The first evaluation runs immediately.
    pub async fn run(&self, period: Duration) {
        let mut ticker = refresh_ticker(period);

        loop {
            ticker.tick().await;
            self.refresh().await;
        }
    }

    fn log_alarm(record: &AlarmRecord) {
        if record.increase_after_decrease_limit_reached {
            tracing::info!(
                "INCREASE AFTER DECREASE: {} ({}) recovered to {} from low {} (limit {})",
                record.symbol,
                record.company_name,
                record.latest_price,
                record.lowest_price,
                record.increase_limit_label
            );
        } else if record.decrease_limit_reached {
            tracing::info!(
                "DECREASE: {} ({}) fell to {} from opening {} (limit {})",
                record.symbol,
                record.company_name,
                record.lowest_price,
                record.opening_price,
                record.decrease_limit_label
            );
        }
    }
}

/// A batch slower than the period delays the next tick instead of
/// queueing catch-up ticks
fn refresh_ticker(period: Duration) -> Interval {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}
