use chrono::{DateTime, FixedOffset};

/// Alarm parameters shared by every symbol in a run
#[derive(Debug, Clone)]
pub struct MonitoringConfig {
    /// Symbols to evaluate, in configured order
    pub symbols: Vec<String>,
    /// % drop from the opening price that raises the decrease alarm
    pub decrease_limit_pct: f64,
    /// % recovery above the low that raises the increase alarm
    pub increase_after_decrease_limit_pct: f64,
    /// Requested start of the observation window
    pub requested_start: DateTime<FixedOffset>,
    /// Decimals kept in reported prices
    pub price_decimals: u32,
}

impl MonitoringConfig {
    pub fn decrease_limit_label(&self) -> String {
        limit_label(self.decrease_limit_pct)
    }

    pub fn increase_limit_label(&self) -> String {
        limit_label(self.increase_after_decrease_limit_pct)
    }
}

fn limit_label(pct: f64) -> String {
    format!("{:?} %", pct)
}
