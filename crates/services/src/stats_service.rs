use chrono::FixedOffset;

use quiz_core::Clock;
use quiz_core::model::HistoryEntry;
use quiz_core::stats::StudyStats;

use crate::persistence::PersistenceBridge;

/// Aggregates study history for the home and analysis views.
#[derive(Clone)]
pub struct StatsService {
    clock: Clock,
    offset: FixedOffset,
    persistence: PersistenceBridge,
}

impl StatsService {
    #[must_use]
    pub fn new(clock: Clock, offset: FixedOffset, persistence: PersistenceBridge) -> Self {
        Self {
            clock,
            offset,
            persistence,
        }
    }

    pub async fn stats(&self) -> StudyStats {
        let history = self.persistence.history().await;
        StudyStats::from_history(&history, self.clock.now(), self.offset)
    }

    /// Most recent completed sessions first.
    pub async fn recent(&self, limit: usize) -> Vec<HistoryEntry> {
        let mut history = self.persistence.history().await;
        history.truncate(limit);
        history
    }
}
