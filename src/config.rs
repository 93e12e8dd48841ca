use std::fs;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, TimeZone};
use chrono_tz::Tz;
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::business_logic::config::MonitoringConfig;
use crate::errors::ConfigError;

pub const CONFIG_PATH_ENV: &str = "STALARM_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Everything read from the config file
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub monitoring: Arc<MonitoringConfig>,
    pub service: ServiceConfig,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_addr: String,
    pub update_frequency: Duration,
    /// Zone used for the start date and for displayed timestamps
    pub timezone: Tz,
}

#[derive(Debug, Deserialize, Validate)]
struct ConfigFile {
    #[validate(nested)]
    stocks: StocksSection,
    #[validate(nested)]
    settings: SettingsSection,
}

#[derive(Debug, Deserialize, Validate)]
struct StocksSection {
    /// Comma separated symbol codes
    #[validate(custom(function = "validate_symbols"))]
    symbols: String,
}

#[derive(Debug, Deserialize, Validate)]
struct SettingsSection {
    #[validate(range(min = 0.0))]
    alarm_limit_decrease: f64,
    #[validate(range(min = 0.0))]
    alarm_limit_increase_after_decrease: f64,
    #[validate(custom(function = "validate_start_date"))]
    start_date: String,
    #[validate(range(max = 10))]
    max_price_decimals: u32,
    /// IANA zone name
    #[serde(default = "default_timezone")]
    #[validate(custom(function = "validate_timezone"))]
    timezone: String,
    #[serde(default = "default_update_frequency_secs")]
    #[validate(range(min = 1))]
    update_frequency_secs: u64,
    #[serde(default = "default_bind_addr")]
    #[validate(length(min = 1))]
    bind_addr: String,
}

impl AppConfig {
    /// Load from the path in `STALARM_CONFIG`, or `config.toml`
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        tracing::info!("Loading config from {}", path);

        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        file.validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        let settings = file.settings;
        ensure_finite("alarm_limit_decrease", settings.alarm_limit_decrease)?;
        ensure_finite(
            "alarm_limit_increase_after_decrease",
            settings.alarm_limit_increase_after_decrease,
        )?;
        let timezone = parse_timezone(&settings.timezone)?;
        let start_date = parse_start_date(&settings.start_date)?;
        // An ambiguous local midnight resolves to the earlier instant
        let requested_start = start_date
            .and_hms_opt(0, 0, 0)
            .and_then(|midnight| timezone.from_local_datetime(&midnight).earliest())
            .map(|start| start.fixed_offset())
            .ok_or_else(|| ConfigError::Invalid("start_date cannot be localized".to_string()))?;

        Ok(Self {
            monitoring: Arc::new(MonitoringConfig {
                symbols: split_symbols(&file.stocks.symbols),
                decrease_limit_pct: settings.alarm_limit_decrease,
                increase_after_decrease_limit_pct: settings.alarm_limit_increase_after_decrease,
                requested_start,
                price_decimals: settings.max_price_decimals,
            }),
            service: ServiceConfig {
                bind_addr: settings.bind_addr,
                update_frequency: Duration::from_secs(settings.update_frequency_secs),
                timezone,
            },
        })
    }
}

/// Spaces are dropped before splitting on commas
fn split_symbols(value: &str) -> Vec<String> {
    value
        .replace(' ', "")
        .split(',')
        .map(str::to_string)
        .collect()
}

fn parse_start_date(value: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| ConfigError::Invalid(format!("start_date {value:?}: {e}")))
}

fn parse_timezone(value: &str) -> Result<Tz, ConfigError> {
    value
        .parse::<Tz>()
        .map_err(|e| ConfigError::Invalid(format!("timezone {value:?}: {e}")))
}

/// `range` lets NaN through, and an infinite limit can never be reached
fn ensure_finite(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        return Ok(());
    }
    Err(ConfigError::Invalid(format!("{name} must be a finite number, got {value}")))
}

fn validate_symbols(value: &str) -> Result<(), ValidationError> {
    if split_symbols(value).iter().all(|s| !s.is_empty()) {
        return Ok(());
    }

    let mut error = ValidationError::new("empty_symbol");
    error.message = Some("symbols must be a comma separated list of non-empty codes".into());
    Err(error)
}

fn validate_start_date(value: &str) -> Result<(), ValidationError> {
    parse_start_date(value)
        .map(|_| ())
        .map_err(|_| invalid("invalid_start_date", "start_date must be YYYY-MM-DD"))
}

fn validate_timezone(value: &str) -> Result<(), ValidationError> {
    parse_timezone(value)
        .map(|_| ())
        .map_err(|_| {
            invalid(
                "invalid_timezone",
                "timezone must be an IANA name like Europe/Stockholm",
            )
        })
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

fn default_timezone() -> String {
    "Europe/Stockholm".to_string()
}

fn default_update_frequency_secs() -> u64 {
    300
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}
