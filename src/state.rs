use std::sync::Arc;

use crate::services::alarm_state::SharedAlarmState;
use crate::services::monitor::MonitorService;

#[derive(Clone)]
pub struct AppState {
    pub alarm_state: SharedAlarmState,
    pub monitor: Arc<MonitorService>,
}
