use crate::models::alarm::AlarmRecord;

/// Display priority of a record, most urgent first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AlarmTier {
    /// Dropped past the decrease limit and recovered past the increase limit
    Recovering,
    /// Dropped past the decrease limit, no recovery yet
    Decreased,
    /// Decrease limit not reached
    Quiet,
}

impl AlarmTier {
    pub fn of(record: &AlarmRecord) -> Self {
        match (
            record.decrease_limit_reached,
            record.increase_after_decrease_limit_reached,
        ) {
            (true, true) => AlarmTier::Recovering,
            (true, false) => AlarmTier::Decreased,
            (false, _) => AlarmTier::Quiet,
        }
    }
}

/// Orders records by tier. The sort is stable, so records within a tier keep
/// the order they were produced in.
pub fn rank(mut records: Vec<AlarmRecord>) -> Vec<AlarmRecord> {
    records.sort_by_key(AlarmTier::of);
    records
}
