//! Decision counters for authorizer observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of authorizer decision counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecisionStats {
    /// Total number of `is_granted` calls
    pub total_checks: u64,

    /// Checks that granted access
    pub granted: u64,

    /// Checks that denied access
    pub denied: u64,

    /// Checks answered with the default decision because role or resource was empty
    pub skipped: u64,

    /// Checks that failed with an error
    pub errors: u64,
}

impl DecisionStats {
    /// Fraction of evaluated checks that granted access
    pub fn grant_rate(&self) -> f64 {
        let evaluated = self.granted + self.denied;
        if evaluated == 0 {
            0.0
        } else {
            self.granted as f64 / evaluated as f64
        }
    }
}

/// Outcome of a single check, as recorded by [`DecisionCounters`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Granted,
    Denied,
    Skipped,
    Failed,
}

/// Lock-free counters shared by clones of an authorizer
#[derive(Debug, Default)]
pub(crate) struct DecisionCounters {
    total_checks: AtomicU64,
    granted: AtomicU64,
    denied: AtomicU64,
    skipped: AtomicU64,
    errors: AtomicU64,
}

impl DecisionCounters {
    pub(crate) fn record(&self, outcome: Outcome) {
        self.total_checks.fetch_add(1, Ordering::Relaxed);
        let counter = match outcome {
            Outcome::Granted => &self.granted,
            Outcome::Denied => &self.denied,
            Outcome::Skipped => &self.skipped,
            Outcome::Failed => &self.errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> DecisionStats {
        DecisionStats {
            total_checks: self.total_checks.load(Ordering::Relaxed),
            granted: self.granted.load(Ordering::Relaxed),
            denied: self.denied.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}
