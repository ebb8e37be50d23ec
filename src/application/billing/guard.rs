//! Once-per-period run guard
//!
//! `Period` scope lets one run per calendar month (UTC) do work.
//! `Process` scope is a use-once latch: after the first claim no later
//! tick does anything for the rest of the process lifetime.

use std::fmt;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// Calendar month a run bills for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BillingPeriod {
    pub year: i32,
    pub month: u32,
}

impl BillingPeriod {
    pub fn of(at: DateTime<Utc>) -> Self {
        Self {
            year: at.year(),
            month: at.month(),
        }
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuardScope {
    #[default]
    Period,
    Process,
}

#[derive(Debug, Default)]
struct GuardState {
    claimed: Option<BillingPeriod>,
    previous: Option<BillingPeriod>,
    latched: bool,
}

#[derive(Debug)]
pub struct RunGuard {
    scope: GuardScope,
    state: Mutex<GuardState>,
}

impl RunGuard {
    pub fn new(scope: GuardScope) -> Self {
        Self {
            scope,
            state: Mutex::new(GuardState::default()),
        }
    }

    pub fn scope(&self) -> GuardScope {
        self.scope
    }

    fn state(&self) -> MutexGuard<'_, GuardState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Claim `period` for a run. False if it (or a later period) was
    /// already claimed, or if the process latch is set.
    pub fn try_claim(&self, period: BillingPeriod) -> bool {
        let mut state = self.state();
        match self.scope {
            GuardScope::Process => {
                if state.latched {
                    return false;
                }
                state.latched = true;
                state.claimed = Some(period);
                true
            }
            GuardScope::Period => {
                if matches!(state.claimed, Some(last) if last >= period) {
                    return false;
                }
                state.previous = state.claimed.replace(period);
                true
            }
        }
    }

    /// Give back a claim whose run did no work. The process latch is
    /// never released.
    pub fn release(&self, period: BillingPeriod) {
        if self.scope == GuardScope::Process {
            return;
        }
        let mut state = self.state();
        if state.claimed == Some(period) {
            state.claimed = state.previous.take();
        }
    }

    pub fn last_claimed(&self) -> Option<BillingPeriod> {
        self.state().claimed
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn period(year: i32, month: u32) -> BillingPeriod {
        BillingPeriod { year, month }
    }

    #[test]
    fn period_from_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap();
        assert_eq!(BillingPeriod::of(at), period(2024, 2));
        assert_eq!(BillingPeriod::of(at).to_string(), "2024-02");
    }

    #[test]
    fn period_scope_allows_one_claim_per_month() {
        let guard = RunGuard::new(GuardScope::Period);
        assert!(guard.try_claim(period(2024, 3)));
        assert!(!guard.try_claim(period(2024, 3)));
        assert!(guard.try_claim(period(2024, 4)));
        assert!(!guard.try_claim(period(2024, 3)), "earlier period must not re-run");
        assert_eq!(guard.last_claimed(), Some(period(2024, 4)));
    }

    #[test]
    fn period_release_allows_retry() {
        let guard = RunGuard::new(GuardScope::Period);
        assert!(guard.try_claim(period(2024, 3)));
        assert!(guard.try_claim(period(2024, 4)));
        guard.release(period(2024, 4));
        assert_eq!(guard.last_claimed(), Some(period(2024, 3)));
        assert!(guard.try_claim(period(2024, 4)));
    }

    #[test]
    fn release_of_other_period_is_ignored() {
        let guard = RunGuard::new(GuardScope::Period);
        assert!(guard.try_claim(period(2024, 5)));
        guard.release(period(2024, 4));
        assert!(!guard.try_claim(period(2024, 5)));
    }

    #[test]
    fn process_scope_latches_forever() {
        let guard = RunGuard::new(GuardScope::Process);
        assert!(guard.try_claim(period(2024, 3)));
        guard.release(period(2024, 3));
        assert!(!guard.try_claim(period(2024, 3)));
        assert!(!guard.try_claim(period(2025, 1)));
    }

    #[test]
    fn scope_deserializes_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            scope: GuardScope,
        }
        let w: Wrapper = toml::from_str(r#"scope = "process""#).unwrap();
        assert_eq!(w.scope, GuardScope::Process);
        assert_eq!(GuardScope::default(), GuardScope::Period);
    }
}
