//! Usage tracker for external API calls

use parking_lot::Mutex;
use std::sync::Arc;
use trip_planner_core::SharedClock;

use crate::{UsageError, UsageKind, UsageStats, UsageStore, USAGE_SCHEMA_VERSION};

/// Optional quotas checked before an outgoing call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsageLimits {
    pub max_requests_per_day: Option<u64>,
    pub max_requests_per_minute: Option<u64>,
    pub max_tokens_per_day: Option<u64>,
}

impl UsageLimits {
    /// No limits
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn requests_per_day(mut self, max: u64) -> Self {
        self.max_requests_per_day = Some(max);
        self
    }

    pub fn requests_per_minute(mut self, max: u64) -> Self {
        self.max_requests_per_minute = Some(max);
        self
    }

    pub fn tokens_per_day(mut self, max: u64) -> Self {
        self.max_tokens_per_day = Some(max);
        self
    }

    fn check(&self, stats: &UsageStats) -> Result<(), UsageError> {
        let windows = [
            ("requests per day", stats.requests_today, self.max_requests_per_day),
            ("requests per minute", stats.requests_this_minute, self.max_requests_per_minute),
            ("tokens per day", stats.tokens_today, self.max_tokens_per_day),
        ];

        for (window, used, max) in windows {
            if let Some(max) = max {
                if used >= max {
                    return Err(UsageError::LimitExceeded { window, used, max });
                }
            }
        }
        Ok(())
    }
}

/// Counts external API calls per day and per minute.
///
/// State lives in this instance; the store is only touched by [`load`],
/// [`flush`], [`get_usage_stats`] and after each mutation. Storage failures
/// are logged and swallowed so tracking never blocks the call it observes.
/// Mutations are serialized by a mutex, so concurrent callers never lose
/// increments within one process.
///
/// [`load`]: UsageTracker::load
/// [`flush`]: UsageTracker::flush
/// [`get_usage_stats`]: UsageTracker::get_usage_stats
pub struct UsageTracker {
    state: Mutex<UsageStats>,
    store: Arc<dyn UsageStore>,
    clock: SharedClock,
    storage_key: String,
    limits: UsageLimits,
}

impl UsageTracker {
    /// Create a tracker with zeroed stats. Performs no I/O.
    pub fn new(namespace: &str, store: Arc<dyn UsageStore>, clock: SharedClock) -> Self {
        Self {
            state: Mutex::new(UsageStats::new(clock.today())),
            store,
            clock,
            storage_key: format!("{}.usage_stats", namespace),
            limits: UsageLimits::default(),
        }
    }

    /// Set quotas enforced by [`UsageTracker::check_limits`]
    pub fn with_limits(mut self, limits: UsageLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> &UsageLimits {
        &self.limits
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Replace in-memory state with the persisted record, if there is a
    /// usable one. Returns `true` when a record was adopted.
    pub fn load(&self) -> bool {
        let mut state = self.state.lock();
        match self.read_record() {
            Some(stats) => {
                *state = stats;
                true
            }
            None => false,
        }
    }

    /// Persist the current state
    pub fn flush(&self) {
        let state = self.state.lock();
        self.persist(&state);
    }

    /// Count one call attempt of `kind`, successful or not
    pub fn increment_usage(&self, kind: UsageKind) {
        let now = self.clock.now_millis();
        let today = self.clock.today();

        let mut state = self.state.lock();
        state.roll_over(now, today);
        state.record_request(kind, now);

        tracing::debug!(
            kind = %kind,
            requests_today = state.requests_today,
            requests_this_minute = state.requests_this_minute,
            "Usage recorded"
        );

        self.persist(&state);
    }

    /// Add AI tokens consumed by a call
    pub fn record_tokens(&self, tokens: u64) {
        let now = self.clock.now_millis();
        let today = self.clock.today();

        let mut state = self.state.lock();
        state.roll_over(now, today);
        state.tokens_today += tokens;
        self.persist(&state);
    }

    /// Current stats, re-read from storage and rolled over to now.
    ///
    /// The stored record is adopted only when it is not older than the
    /// in-memory state, so failed writes never make counts go backwards.
    pub fn get_usage_stats(&self) -> UsageStats {
        let now = self.clock.now_millis();
        let today = self.clock.today();

        let mut state = self.state.lock();
        match self.read_record() {
            Some(stored) if stored.is_not_older_than(&state) => *state = stored,
            Some(stored) => tracing::debug!(
                stored_requests = stored.requests_today,
                requests_today = state.requests_today,
                "Ignoring stale stored usage"
            ),
            None => {}
        }
        if state.roll_over(now, today) {
            self.persist(&state);
        }
        state.clone()
    }

    /// Zero every counter and persist
    pub fn reset_usage_stats(&self) {
        let mut state = self.state.lock();
        *state = UsageStats::new(self.clock.today());
        tracing::info!(key = %self.storage_key, "Usage stats reset");
        self.persist(&state);
    }

    /// Fail if any configured quota is already used up
    pub fn check_limits(&self) -> Result<(), UsageError> {
        let mut snapshot = self.state.lock().clone();
        snapshot.roll_over(self.clock.now_millis(), self.clock.today());
        self.limits.check(&snapshot)
    }

    fn read_record(&self) -> Option<UsageStats> {
        let json = match self.store.read(&self.storage_key) {
            Ok(Some(json)) => json,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(store = self.store.name(), error = %e, "Failed to read usage stats");
                return None;
            }
        };

        match serde_json::from_str::<UsageStats>(&json) {
            Ok(stats) if stats.schema_version == USAGE_SCHEMA_VERSION => Some(stats),
            Ok(stats) => {
                tracing::warn!(
                    found = stats.schema_version,
                    expected = USAGE_SCHEMA_VERSION,
                    "Discarding usage stats with unknown schema version"
                );
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable usage stats");
                None
            }
        }
    }

    fn persist(&self, stats: &UsageStats) {
        let result = serde_json::to_string(stats)
            .map_err(UsageError::from)
            .and_then(|json| self.store.write(&self.storage_key, &json));

        if let Err(e) = result {
            tracing::warn!(store = self.store.name(), error = %e, "Failed to persist usage stats");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryUsageStore;
    use chrono::NaiveDate;
    use std::time::Duration;
    use trip_planner_core::ManualClock;

    struct BrokenStore;

    impl UsageStore for BrokenStore {
        fn read(&self, _key: &str) -> Result<Option<String>, UsageError> {
            Err(UsageError::Storage("disabled".into()))
        }

        fn write(&self, _key: &str, _json: &str) -> Result<(), UsageError> {
            Err(UsageError::Storage("disabled".into()))
        }

        fn name(&self) -> &'static str {
            "broken"
        }
    }

    /// Reads return a fixed record, writes always fail
    struct ReadOnlyStore {
        record: String,
    }

    impl UsageStore for ReadOnlyStore {
        fn read(&self, _key: &str) -> Result<Option<String>, UsageError> {
            Ok(Some(self.record.clone()))
        }

        fn write(&self, _key: &str, _json: &str) -> Result<(), UsageError> {
            Err(UsageError::Storage("quota exceeded".into()))
        }

        fn name(&self) -> &'static str {
            "read-only"
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn tracker_at(d: u32) -> (UsageTracker, Arc<ManualClock>, Arc<MemoryUsageStore>) {
        let clock = Arc::new(ManualClock::at_day(day(d)));
        let store = Arc::new(MemoryUsageStore::new());
        let tracker = UsageTracker::new("maps", store.clone(), clock.clone());
        (tracker, clock, store)
    }

    #[test]
    fn test_increment_persists_after_each_call() {
        let (tracker, _, store) = tracker_at(1);

        tracker.increment_usage(UsageKind::Geocode);
        tracker.increment_usage(UsageKind::Directions);

        let json = store.read("maps.usage_stats").unwrap().unwrap();
        let stored: UsageStats = serde_json::from_str(&json).unwrap();
        assert_eq!(stored.requests_today, 2);
        assert_eq!(stored.count(UsageKind::Geocode), 1);
        assert_eq!(stored.count(UsageKind::Directions), 1);
    }

    #[test]
    fn test_daily_rollover_on_read() {
        let (tracker, clock, store) = tracker_at(1);

        let mut persisted = UsageStats::new(day(1));
        persisted.requests_today = 5;
        store
            .write("maps.usage_stats", &serde_json::to_string(&persisted).unwrap())
            .unwrap();

        assert_eq!(tracker.get_usage_stats().requests_today, 5);

        clock.advance(Duration::from_secs(86_400));
        let stats = tracker.get_usage_stats();
        assert_eq!(stats.requests_today, 0);
        assert_eq!(stats.day, day(2));
    }

    #[test]
    fn test_minute_rollover() {
        let (tracker, clock, _) = tracker_at(1);

        for _ in 0..3 {
            tracker.increment_usage(UsageKind::PlaceSearch);
            clock.advance(Duration::from_secs(10));
        }
        assert_eq!(tracker.get_usage_stats().requests_this_minute, 3);

        // 10s already elapsed since the last call; push past the 60s window
        clock.advance(Duration::from_millis(50_001));
        tracker.increment_usage(UsageKind::PlaceSearch);

        let stats = tracker.get_usage_stats();
        assert_eq!(stats.requests_this_minute, 1);
        assert_eq!(stats.requests_today, 4);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let (tracker, _, _) = tracker_at(1);
        tracker.increment_usage(UsageKind::Geocode);
        tracker.record_tokens(1200);

        tracker.reset_usage_stats();
        let first = tracker.get_usage_stats();
        tracker.reset_usage_stats();
        let second = tracker.get_usage_stats();

        assert_eq!(first, second);
        assert_eq!(first, UsageStats::new(day(1)));
    }

    #[test]
    fn test_snapshot_is_detached() {
        let (tracker, _, _) = tracker_at(1);
        let mut snapshot = tracker.get_usage_stats();
        snapshot.requests_today = 99;

        assert_eq!(tracker.get_usage_stats().requests_today, 0);
    }

    #[test]
    fn test_storage_failures_are_swallowed() {
        let clock = Arc::new(ManualClock::at_day(day(1)));
        let tracker = UsageTracker::new("maps", Arc::new(BrokenStore), clock);

        tracker.increment_usage(UsageKind::Geocode);
        tracker.increment_usage(UsageKind::Geocode);
        tracker.flush();

        assert!(!tracker.load());
        assert_eq!(tracker.get_usage_stats().requests_today, 2);
    }

    #[test]
    fn test_stale_stored_record_does_not_roll_counts_back() {
        let clock = Arc::new(ManualClock::at_day(day(1)));
        let mut stale = UsageStats::new(day(1));
        stale.requests_today = 1;
        let store = Arc::new(ReadOnlyStore {
            record: serde_json::to_string(&stale).unwrap(),
        });
        let tracker = UsageTracker::new("maps", store, clock.clone())
            .with_limits(UsageLimits::unlimited().requests_per_day(3));

        for _ in 0..3 {
            clock.advance(Duration::from_secs(1));
            tracker.increment_usage(UsageKind::Geocode);
        }

        assert_eq!(tracker.get_usage_stats().requests_today, 3);
        assert!(tracker.check_limits().is_err());
    }

    #[test]
    fn test_newer_stored_record_is_adopted() {
        let (tracker, clock, store) = tracker_at(1);
        tracker.increment_usage(UsageKind::Geocode);

        // Another instance sharing the store counted two more since
        clock.advance(Duration::from_secs(5));
        let other = UsageTracker::new("maps", store, clock.clone());
        other.load();
        other.increment_usage(UsageKind::Geocode);
        other.increment_usage(UsageKind::Directions);

        assert_eq!(tracker.get_usage_stats().requests_today, 3);
    }

    #[test]
    fn test_load_adopts_persisted_record() {
        let (first, clock, store) = tracker_at(1);
        first.increment_usage(UsageKind::Autocomplete);

        let second = UsageTracker::new("maps", store.clone(), clock.clone());
        assert_eq!(second.get_usage_stats().count(UsageKind::Autocomplete), 1);

        let third = UsageTracker::new("maps", store, clock);
        assert!(third.load());
    }

    #[test]
    fn test_unknown_schema_version_is_discarded() {
        let (tracker, _, store) = tracker_at(1);
        store
            .write(
                "maps.usage_stats",
                r#"{"day":"2024-05-01","requests_today":40,"tokens_today":0,
                    "requests_this_minute":0,"last_request_time":0}"#,
            )
            .unwrap();

        assert!(!tracker.load());
        assert_eq!(tracker.get_usage_stats().requests_today, 0);

        store.write("maps.usage_stats", "not json").unwrap();
        assert!(!tracker.load());
    }

    #[test]
    fn test_limits() {
        let (tracker, clock, _) = tracker_at(1);
        let tracker = tracker.with_limits(
            UsageLimits::unlimited()
                .requests_per_minute(2)
                .requests_per_day(3),
        );

        tracker.increment_usage(UsageKind::Geocode);
        assert!(tracker.check_limits().is_ok());
        tracker.increment_usage(UsageKind::Geocode);
        assert!(matches!(
            tracker.check_limits(),
            Err(UsageError::LimitExceeded { window: "requests per minute", used: 2, max: 2 })
        ));

        clock.advance(Duration::from_secs(61));
        assert!(tracker.check_limits().is_ok());
        tracker.increment_usage(UsageKind::Geocode);
        assert!(matches!(
            tracker.check_limits(),
            Err(UsageError::LimitExceeded { window: "requests per day", .. })
        ));
    }

    #[test]
    fn test_token_limit() {
        let (tracker, _, _) = tracker_at(1);
        let tracker = tracker.with_limits(UsageLimits::unlimited().tokens_per_day(1000));

        tracker.record_tokens(999);
        assert!(tracker.check_limits().is_ok());
        tracker.record_tokens(1);
        assert!(tracker.check_limits().is_err());
    }
}
