//! Success / failure / pending tallies.

use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::Serialize;

/// The classification a single report call contributes to the tallies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
    Pending,
}

/// Live counters owned by one suite run. Only ever incremented.
#[derive(Debug, Default)]
pub struct Counters {
    success: u64,
    failure: u64,
    pending: u64,
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Success => self.success += 1,
            Outcome::Failure => self.failure += 1,
            Outcome::Pending => self.pending += 1,
        }
    }

    pub fn success(&self) -> u64 {
        self.success
    }

    pub fn failure(&self) -> u64 {
        self.failure
    }

    pub fn pending(&self) -> u64 {
        self.pending
    }

    pub fn snapshot(&self) -> Summary {
        Summary {
            succeeded: self.success,
            failed: self.failure,
            pending: self.pending,
        }
    }
}

/// Read-only copy of the counters, taken when a run finishes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub succeeded: u64,
    pub failed: u64,
    pub pending: u64,
}

impl Summary {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    pub fn total(&self) -> u64 {
        self.succeeded + self.failed + self.pending
    }

    /// The failure count; zero means every assertion held.
    pub fn exit_status(&self) -> u64 {
        self.failed
    }

    /// [`exit_status`](Self::exit_status) clamped to what a process can return
    /// without wrapping back to zero.
    pub fn process_status(&self) -> i32 {
        self.failed.min(255) as i32
    }

    /// Summary lines in print order, with zero counts left out.
    pub fn lines(&self) -> Vec<(&'static str, u64)> {
        [
            ("Succeed", self.succeeded),
            ("Failed", self.failed),
            ("Pending", self.pending),
        ]
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .collect()
    }

    /// Folds another finished run into this one.
    pub fn merge(&mut self, other: Summary) {
        *self += other;
    }
}

impl Add for Summary {
    type Output = Summary;

    fn add(self, rhs: Summary) -> Summary {
        Summary {
            succeeded: self.succeeded + rhs.succeeded,
            failed: self.failed + rhs.failed,
            pending: self.pending + rhs.pending,
        }
    }
}

impl AddAssign for Summary {
    fn add_assign(&mut self, rhs: Summary) {
        *self = *self + rhs;
    }
}

impl Sum for Summary {
    fn sum<I: Iterator<Item = Summary>>(iter: I) -> Summary {
        iter.fold(Summary::default(), Add::add)
    }
}
