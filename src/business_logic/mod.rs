pub mod alarm;
pub mod config;
pub mod ranking;
