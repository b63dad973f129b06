//! Caller-owned per-session state.
//!
//! The classifier is stateless per call; everything that spans calls lives
//! here and is passed in by `&mut`. That covers the grace-period streak
//! counters, the consecutive-repeat counters used for escalation, and a
//! small bounded ring of recent violation kinds.

use std::collections::{HashMap, VecDeque};

use crate::detect::{ViolationKind, Warning};

/// Bound on the recent-violation ring.
pub const MAX_RECENT_VIOLATIONS: usize = 32;

/// Alert severity, escalating with consecutive repeats of the same kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    #[default]
    Notice,
    Warning,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Notice => "notice",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Default)]
pub struct SessionState {
    head_away_streak: u32,
    hands_missing_streak: u32,
    repeats: HashMap<ViolationKind, u32>,
    recent: VecDeque<ViolationKind>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn bump_head_away(&mut self) -> u32 {
        self.head_away_streak += 1;
        self.head_away_streak
    }

    pub(crate) fn reset_head_away(&mut self) {
        self.head_away_streak = 0;
    }

    pub(crate) fn bump_hands_missing(&mut self) -> u32 {
        self.hands_missing_streak += 1;
        self.hands_missing_streak
    }

    pub(crate) fn reset_hands_missing(&mut self) {
        self.hands_missing_streak = 0;
    }

    /// Fold one call's warnings into the escalation counters.
    ///
    /// Each kind present counts once per call; a kind absent from the call
    /// resets its consecutive counter.
    pub fn note_violations(&mut self, warnings: &[Warning]) {
        let mut present: Vec<ViolationKind> = Vec::new();
        for warning in warnings {
            if !present.contains(&warning.kind) {
                present.push(warning.kind);
            }
        }

        self.repeats.retain(|kind, _| present.contains(kind));
        for kind in present {
            *self.repeats.entry(kind).or_insert(0) += 1;
            if self.recent.len() >= MAX_RECENT_VIOLATIONS {
                self.recent.pop_front();
            }
            self.recent.push_back(kind);
        }
    }

    /// Consecutive calls in which this kind has fired.
    pub fn repeat_count(&self, kind: ViolationKind) -> u32 {
        self.repeats.get(&kind).copied().unwrap_or(0)
    }

    pub fn severity_for(&self, kind: ViolationKind) -> Severity {
        match self.repeat_count(kind) {
            0..=1 => Severity::Notice,
            2..=3 => Severity::Warning,
            _ => Severity::Critical,
        }
    }

    pub fn recent_violations(&self) -> impl Iterator<Item = ViolationKind> + '_ {
        self.recent.iter().copied()
    }
}
