use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const LEDGER_FILE: &str = "usage.json";

/// Lookups spent in the current calendar month
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageLedger {
    pub usage_count: u32,
    pub last_reset: String, // YYYY-MM
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageDecision {
    Granted { remaining: u32 },
    LimitReached,
}

/// Monthly lookup quota persisted under the state directory
pub struct UsageTracker {
    state_dir: PathBuf,
    max_usage: u32,
}

impl UsageTracker {
    pub fn new(state_dir: PathBuf, max_usage: u32) -> Result<Self> {
        fs::create_dir_all(&state_dir)?;
        Ok(Self {
            state_dir,
            max_usage,
        })
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.state_dir.join(LEDGER_FILE)
    }

    /// Load the ledger; a missing or unreadable file starts a fresh one
    pub fn load(&self) -> UsageLedger {
        let path = self.ledger_path();
        let Ok(raw) = fs::read(&path) else {
            return UsageLedger::default();
        };
        match serde_json::from_slice(&raw) {
            Ok(ledger) => ledger,
            Err(e) => {
                warn!("Discarding corrupt usage ledger {}: {}", path.display(), e);
                UsageLedger::default()
            }
        }
    }

    fn store(&self, ledger: &UsageLedger) -> Result<()> {
        let path = self.ledger_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, serde_json::to_vec_pretty(ledger)?)?;
        Ok(())
    }

    /// Spend one lookup against the current UTC month.
    pub fn consume_now(&self) -> Result<UsageDecision> {
        self.consume(&Utc::now())
    }

    /// Spend one lookup if the allowance for `now`'s month permits it.
    ///
    /// Months are keyed in UTC whatever the offset of `now`.
    pub fn consume<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Result<UsageDecision> {
        let month = now.with_timezone(&Utc).format("%Y-%m").to_string();
        let mut ledger = self.load();

        if ledger.last_reset != month {
            debug!("Resetting usage ledger for {}", month);
            ledger = UsageLedger {
                usage_count: 0,
                last_reset: month,
            };
            self.store(&ledger)?;
        }

        if ledger.usage_count >= self.max_usage {
            return Ok(UsageDecision::LimitReached);
        }

        ledger.usage_count += 1;
        self.store(&ledger)?;

        Ok(UsageDecision::Granted {
            remaining: self.max_usage - ledger.usage_count,
        })
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn at(year: i32, month: u32, day: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(year, month, day, 10, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_consume_until_limit() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = UsageTracker::new(dir.path().to_path_buf(), 2).unwrap();

        assert_eq!(tracker.consume(&at(2024, 5, 1)).unwrap(), UsageDecision::Granted { remaining: 1 });
        assert_eq!(tracker.consume(&at(2024, 5, 2)).unwrap(), UsageDecision::Granted { remaining: 0 });
        assert_eq!(tracker.consume(&at(2024, 5, 3)).unwrap(), UsageDecision::LimitReached);
        assert_eq!(tracker.load().usage_count, 2);
    }

    #[test]
    fn test_new_month_resets() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = UsageTracker::new(dir.path().to_path_buf(), 1).unwrap();

        tracker.consume(&at(2024, 5, 31)).unwrap();
        assert_eq!(tracker.consume(&at(2024, 5, 31)).unwrap(), UsageDecision::LimitReached);
        assert_eq!(tracker.consume(&at(2024, 6, 1)).unwrap(), UsageDecision::Granted { remaining: 0 });
        assert_eq!(tracker.load().last_reset, "2024-06");
    }

    #[test]
    fn test_month_is_keyed_in_utc() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = UsageTracker::new(dir.path().to_path_buf(), 5).unwrap();

        // Still May locally, already June in UTC
        let late_may = FixedOffset::west_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 5, 31, 23, 30, 0)
            .unwrap();
        tracker.consume(&late_may).unwrap();
        assert_eq!(tracker.load().last_reset, "2024-06");
    }

    #[test]
    fn test_consume_now_uses_current_month() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = UsageTracker::new(dir.path().to_path_buf(), 1).unwrap();

        assert_eq!(tracker.consume_now().unwrap(), UsageDecision::Granted { remaining: 0 });
        assert_eq!(tracker.consume_now().unwrap(), UsageDecision::LimitReached);
        assert_eq!(tracker.load().last_reset, Utc::now().format("%Y-%m").to_string());
    }

    #[test]
    fn test_corrupt_ledger_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = UsageTracker::new(dir.path().join("nested"), 10).unwrap();
        fs::write(tracker.ledger_path(), b"{not json").unwrap();

        assert_eq!(tracker.load(), UsageLedger::default());
        assert_eq!(tracker.consume(&at(2024, 1, 1)).unwrap(), UsageDecision::Granted { remaining: 9 });
    }
}
