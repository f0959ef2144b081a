use std::time::Duration;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Pomodoro schedule
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Global scheduling defaults.  Communities and individual start requests
/// may override the three durations (see [`TimingOverrides`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PomodoroConfig {
    #[serde(default = "d_work_secs")]
    pub work_secs: u64,
    #[serde(default = "d_short_break_secs")]
    pub short_break_secs: u64,
    #[serde(default = "d_long_break_secs")]
    pub long_break_secs: u64,
    /// A long break follows every N-th cycle (never the final one).
    #[serde(default = "d_long_break_every")]
    pub long_break_every: u32,
    #[serde(default = "d_min_cycles")]
    pub min_cycles: u32,
    #[serde(default = "d_max_cycles")]
    pub max_cycles: u32,
    /// How long the quiz waits for answers before recording a zero.
    #[serde(default = "d_quiz_answer_timeout_secs")]
    pub quiz_answer_timeout_secs: u64,
    /// Minimum time between two session starts by the same user.
    #[serde(default = "d_start_cooldown_secs")]
    pub start_cooldown_secs: u64,
}

impl Default for PomodoroConfig {
    fn default() -> Self {
        Self {
            work_secs: d_work_secs(),
            short_break_secs: d_short_break_secs(),
            long_break_secs: d_long_break_secs(),
            long_break_every: d_long_break_every(),
            min_cycles: d_min_cycles(),
            max_cycles: d_max_cycles(),
            quiz_answer_timeout_secs: d_quiz_answer_timeout_secs(),
            start_cooldown_secs: d_start_cooldown_secs(),
        }
    }
}

impl PomodoroConfig {
    pub fn timings(&self) -> Timings {
        Timings {
            work: Duration::from_secs(self.work_secs),
            short_break: Duration::from_secs(self.short_break_secs),
            long_break: Duration::from_secs(self.long_break_secs),
            long_break_every: self.long_break_every,
        }
    }

    pub fn quiz_answer_timeout(&self) -> Duration {
        Duration::from_secs(self.quiz_answer_timeout_secs)
    }

    pub fn start_cooldown(&self) -> Duration {
        Duration::from_secs(self.start_cooldown_secs)
    }
}

/// Optional per-community or per-request duration overrides, in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_break_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_break_secs: Option<u64>,
}

impl TimingOverrides {
    /// True if any override is set to zero seconds.
    pub fn has_zero(&self) -> bool {
        [self.work_secs, self.short_break_secs, self.long_break_secs]
            .contains(&Some(0))
    }
}

/// Which kind of break follows a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakKind {
    Short,
    Long,
}

/// Resolved durations for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub work: Duration,
    pub short_break: Duration,
    pub long_break: Duration,
    pub long_break_every: u32,
}

impl Default for Timings {
    fn default() -> Self {
        PomodoroConfig::default().timings()
    }
}

impl Timings {
    /// Apply overrides on top of these timings; unset fields keep their value.
    pub fn with_overrides(self, overrides: &TimingOverrides) -> Self {
        Self {
            work: overrides
                .work_secs
                .map(Duration::from_secs)
                .unwrap_or(self.work),
            short_break: overrides
                .short_break_secs
                .map(Duration::from_secs)
                .unwrap_or(self.short_break),
            long_break: overrides
                .long_break_secs
                .map(Duration::from_secs)
                .unwrap_or(self.long_break),
            long_break_every: self.long_break_every,
        }
    }

    /// The break that follows `cycle`, or `None` after the final cycle.
    pub fn break_after(&self, cycle: u32, target: u32) -> Option<(BreakKind, Duration)> {
        if cycle >= target {
            return None;
        }
        if self.long_break_every > 0 && cycle % self.long_break_every == 0 {
            Some((BreakKind::Long, self.long_break))
        } else {
            Some((BreakKind::Short, self.short_break))
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_work_secs() -> u64 {
    25 * 60
}
fn d_short_break_secs() -> u64 {
    5 * 60
}
fn d_long_break_secs() -> u64 {
    15 * 60
}
fn d_long_break_every() -> u32 {
    4
}
fn d_min_cycles() -> u32 {
    1
}
fn d_max_cycles() -> u32 {
    8
}
fn d_quiz_answer_timeout_secs() -> u64 {
    180
}
fn d_start_cooldown_secs() -> u64 {
    300
}
