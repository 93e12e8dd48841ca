pub mod alarm_state;
pub mod market_data;
pub mod monitor;
pub mod yahoo;
