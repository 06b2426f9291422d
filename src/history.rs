use crate::models::{CheckOutcome, DowntimeEvent, Stats, Status};

/// Outcomes of the current session, in check order.
#[derive(Debug, Default)]
pub struct StatusHistory {
    outcomes: Vec<CheckOutcome>,
}

impl StatusHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, outcome: CheckOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn clear(&mut self) {
        self.outcomes.clear();
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Recomputed over the whole sequence on every call.
    pub fn stats(&self) -> Stats {
        Stats::from_samples(self.outcomes.iter().map(|o| (o.status, o.response_time_ms)))
    }

    /// DOWN outcomes with their 1-based check numbers.
    pub fn downtime(&self) -> Vec<DowntimeEvent> {
        self.outcomes
            .iter()
            .enumerate()
            .filter(|(_, o)| o.status == Status::Down)
            .map(|(i, o)| DowntimeEvent {
                check_number: i + 1,
                timestamp: o.timestamp,
                error: o.error.clone().unwrap_or_default(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn up(ms: u64) -> CheckOutcome {
        CheckOutcome::up(200, Duration::from_millis(ms))
    }

    #[test]
    fn test_empty_history_stats() {
        let stats = StatusHistory::new().stats();
        assert_eq!(stats.total, 0);
        assert_eq!(stats.up_count, 0);
        assert_eq!(stats.down_count, 0);
        assert_eq!(stats.uptime_pct, 0.0);
        assert_eq!(stats.avg_latency_ms, 0.0);
    }

    #[test]
    fn test_average_latency_of_up_entries() {
        let mut history = StatusHistory::new();
        history.append(up(100));
        history.append(up(200));
        history.append(up(300));

        let stats = history.stats();
        assert_eq!(stats.avg_latency_ms, 200.0);
        assert_eq!(stats.uptime_pct, 100.0);
    }

    #[test]
    fn test_counts_always_add_up() {
        let mut history = StatusHistory::new();
        let pattern = [true, false, false, true, true, false, true];
        for (i, is_up) in pattern.iter().enumerate() {
            history.append(if *is_up { up(10) } else { CheckOutcome::down("boom") });
            let stats = history.stats();
            assert_eq!(stats.total, i + 1);
            assert_eq!(stats.up_count + stats.down_count, stats.total);
            let expected = stats.up_count as f64 / stats.total as f64 * 100.0;
            assert!((stats.uptime_pct - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_down_entries_do_not_affect_latency() {
        let mut history = StatusHistory::new();
        history.append(up(40));
        history.append(CheckOutcome::down("timeout"));
        assert_eq!(history.stats().avg_latency_ms, 40.0);
        assert_eq!(history.stats().uptime_pct, 50.0);
    }

    #[test]
    fn test_downtime_keeps_check_numbers() {
        let mut history = StatusHistory::new();
        history.append(up(10));
        history.append(CheckOutcome::down("refused"));
        history.append(up(10));
        history.append(CheckOutcome::down("dns"));

        let downtime = history.downtime();
        assert_eq!(downtime.len(), 2);
        assert_eq!(downtime[0].check_number, 2);
        assert_eq!(downtime[0].error, "refused");
        assert_eq!(downtime[1].check_number, 4);
    }

    #[test]
    fn test_clear_resets() {
        let mut history = StatusHistory::new();
        history.append(up(10));
        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.stats().total, 0);
    }
}
