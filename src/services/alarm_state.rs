use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};

use crate::models::alarm::AlarmReport;

#[derive(Debug)]
pub struct AlarmStateInner {
    /// Latest ranked report; `None` until the first evaluation finishes
    pub report: RwLock<Option<AlarmReport>>,
    pub broadcaster: broadcast::Sender<AlarmReport>,
}

impl AlarmStateInner {
    pub fn new() -> Self {
        let (broadcaster, _receiver) = broadcast::channel(16);
        Self {
            report: RwLock::new(None),
            broadcaster,
        }
    }
}

impl Default for AlarmStateInner {
    fn default() -> Self {
        Self::new()
    }
}

pub type SharedAlarmState = Arc<AlarmStateInner>;
