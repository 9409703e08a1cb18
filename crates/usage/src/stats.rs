//! Usage counters and their rollover rules

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Version written with every persisted record
pub const USAGE_SCHEMA_VERSION: u32 = 1;

/// Window after the last request during which the per-minute counter keeps counting
pub const MINUTE_WINDOW_MS: i64 = 60_000;

/// Kind of external call being counted
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageKind {
    Geocode,
    PlaceSearch,
    PlaceDetails,
    Directions,
    Autocomplete,
    AiGeneration,
}

impl UsageKind {
    pub const ALL: [UsageKind; 6] = [
        UsageKind::Geocode,
        UsageKind::PlaceSearch,
        UsageKind::PlaceDetails,
        UsageKind::Directions,
        UsageKind::Autocomplete,
        UsageKind::AiGeneration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UsageKind::Geocode => "geocode",
            UsageKind::PlaceSearch => "place_search",
            UsageKind::PlaceDetails => "place_details",
            UsageKind::Directions => "directions",
            UsageKind::Autocomplete => "autocomplete",
            UsageKind::AiGeneration => "ai_generation",
        }
    }
}

impl fmt::Display for UsageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Usage statistics snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageStats {
    /// Format version of the persisted record
    #[serde(default)]
    pub schema_version: u32,

    /// Calendar day (UTC) the daily counters belong to
    pub day: NaiveDate,

    /// Requests made on `day`
    pub requests_today: u64,

    /// AI tokens consumed on `day`
    pub tokens_today: u64,

    /// Requests since the per-minute counter last reset
    pub requests_this_minute: u64,

    /// Time of the most recent request (Unix millis), 0 if none yet
    pub last_request_time: i64,

    /// Requests on `day` broken down by kind
    #[serde(default)]
    pub by_kind: BTreeMap<UsageKind, u64>,
}

impl UsageStats {
    /// Zeroed stats for the given day
    pub fn new(day: NaiveDate) -> Self {
        Self {
            schema_version: USAGE_SCHEMA_VERSION,
            day,
            requests_today: 0,
            tokens_today: 0,
            requests_this_minute: 0,
            last_request_time: 0,
            by_kind: BTreeMap::new(),
        }
    }

    /// Apply day and minute rollover. Returns `true` if anything was reset.
    pub fn roll_over(&mut self, now_millis: i64, today: NaiveDate) -> bool {
        let mut changed = false;

        if self.day != today {
            self.day = today;
            self.requests_today = 0;
            self.tokens_today = 0;
            self.by_kind.clear();
            changed = true;
        }

        if self.requests_this_minute > 0 && now_millis - self.last_request_time > MINUTE_WINDOW_MS {
            self.requests_this_minute = 0;
            changed = true;
        }

        changed
    }

    /// Count one request of `kind` at `now_millis` (rollover must already be applied)
    pub(crate) fn record_request(&mut self, kind: UsageKind, now_millis: i64) {
        *self.by_kind.entry(kind).or_insert(0) += 1;
        self.requests_today += 1;
        self.requests_this_minute += 1;
        self.last_request_time = now_millis;
    }

    /// Whether `self` has seen at least as much traffic as `other`.
    ///
    /// Records are ordered by day, then last request time, then counters,
    /// so a stale copy read back from storage never replaces newer counts.
    pub fn is_not_older_than(&self, other: &UsageStats) -> bool {
        let progress = |s: &UsageStats| {
            (s.day, s.last_request_time, s.requests_today, s.tokens_today)
        };
        progress(self) >= progress(other)
    }

    /// Requests of one kind today
    pub fn count(&self, kind: UsageKind) -> u64 {
        self.by_kind.get(&kind).copied().unwrap_or(0)
    }
}

impl fmt::Display for UsageStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "═══════════════════════════════════════════")?;
        writeln!(f, "           API USAGE ({})", self.day)?;
        writeln!(f, "═══════════════════════════════════════════")?;
        writeln!(f, "Requests Today:       {}", self.requests_today)?;
        writeln!(f, "Requests This Minute: {}", self.requests_this_minute)?;
        writeln!(f, "Tokens Today:         {}", self.tokens_today)?;
        writeln!(f, "───────────────────────────────────────────")?;
        for kind in UsageKind::ALL {
            writeln!(f, "{:<22}{}", format!("{}:", kind), self.count(kind))?;
        }
        write!(f, "═══════════════════════════════════════════")
    }
}
