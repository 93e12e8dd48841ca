pub mod alarm;
pub mod chart;
pub mod health;
pub mod price_series;
