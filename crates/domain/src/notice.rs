//! User-facing notices emitted over the course of a session.
//!
//! Transports may forward the structured form (webhook JSON) or the
//! rendered text from [`Notice`]'s `Display` impl.

use std::fmt;

use serde::Serialize;

use crate::config::BreakKind;
use crate::quiz::QuizQuestion;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    SessionStarted {
        topic: String,
        key_points: Vec<String>,
        cycles: u32,
        /// True when content analysis fell back to its placeholder.
        degraded: bool,
    },
    WorkStarted {
        cycle: u32,
        target: u32,
        work_secs: u64,
    },
    QuizPosted {
        cycle: u32,
        questions: Vec<QuizQuestion>,
        answer_timeout_secs: u64,
    },
    QuizScored {
        cycle: u32,
        correct: usize,
        total: usize,
    },
    QuizTimedOut {
        cycle: u32,
    },
    BreakStarted {
        cycle: u32,
        break_kind: BreakKind,
        break_secs: u64,
    },
    SessionCompleted {
        cycles: u32,
        average_score: f64,
        elapsed_secs: u64,
    },
    SessionCancelled {
        reason: String,
        completed_cycles: u32,
    },
    MoveFailed {
        space: String,
        error: String,
    },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionStarted {
                topic,
                key_points,
                cycles,
                degraded,
            } => {
                writeln!(f, "Study session started: {topic} ({cycles} cycles)")?;
                if *degraded {
                    writeln!(f, "(content analysis unavailable, continuing without it)")?;
                }
                for point in key_points {
                    writeln!(f, "  - {point}")?;
                }
                Ok(())
            }
            Self::WorkStarted {
                cycle,
                target,
                work_secs,
            } => write!(
                f,
                "Work phase {cycle}/{target} started: focus for {}.",
                human_duration(*work_secs)
            ),
            Self::QuizPosted {
                cycle,
                questions,
                answer_timeout_secs,
            } => {
                writeln!(
                    f,
                    "Quiz for cycle {cycle} ({} to answer):",
                    human_duration(*answer_timeout_secs)
                )?;
                for (i, q) in questions.iter().enumerate() {
                    writeln!(f, "{}. {}", i + 1, q.question)?;
                    for (letter, text) in &q.options {
                        writeln!(f, "   {letter}) {text}")?;
                    }
                }
                Ok(())
            }
            Self::QuizScored {
                cycle,
                correct,
                total,
            } => write!(f, "Cycle {cycle} quiz: {correct}/{total} correct."),
            Self::QuizTimedOut { cycle } => {
                write!(f, "Cycle {cycle} quiz timed out, recorded as 0.")
            }
            Self::BreakStarted {
                break_kind,
                break_secs,
                ..
            } => {
                let label = match break_kind {
                    BreakKind::Short => "Short",
                    BreakKind::Long => "Long",
                };
                write!(f, "{label} break: {}.", human_duration(*break_secs))
            }
            Self::SessionCompleted {
                cycles,
                average_score,
                elapsed_secs,
            } => write!(
                f,
                "Session complete! {cycles} cycles in {}, average quiz score {:.0}%.",
                human_duration(*elapsed_secs),
                average_score * 100.0
            ),
            Self::SessionCancelled {
                reason,
                completed_cycles,
            } => write!(
                f,
                "Study session cancelled ({reason}) after {completed_cycles} completed cycle(s)."
            ),
            Self::MoveFailed { space, error } => {
                write!(f, "Could not move you to {space}: {error}")
            }
        }
    }
}

/// Render seconds as `1h 5m`, `25m` or `40s`.
pub fn human_duration(secs: u64) -> String {
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    match (h, m, s) {
        (0, 0, s) => format!("{s}s"),
        (0, m, 0) => format!("{m}m"),
        (0, m, s) => format!("{m}m {s}s"),
        (h, 0, _) => format!("{h}h"),
        (h, m, _) => format!("{h}h {m}m"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_duration_formats() {
        assert_eq!(human_duration(40), "40s");
        assert_eq!(human_duration(1500), "25m");
        assert_eq!(human_duration(90), "1m 30s");
        assert_eq!(human_duration(3600), "1h");
        assert_eq!(human_duration(3900), "1h 5m");
    }

    #[test]
    fn notices_serialize_with_kind_tag() {
        let n = Notice::BreakStarted {
            cycle: 4,
            break_kind: BreakKind::Long,
            break_secs: 900,
        };
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["kind"], "break_started");
        assert_eq!(json["break_kind"], "long");
        assert_eq!(json["break_secs"], 900);
        assert_eq!(json.as_object().unwrap().len(), 4);
    }

    #[test]
    fn completion_renders_percentage() {
        let n = Notice::SessionCompleted {
            cycles: 2,
            average_score: 0.5,
            elapsed_secs: 3300,
        };
        assert_eq!(
            n.to_string(),
            "Session complete! 2 cycles in 55m, average quiz score 50%."
        );
    }
}
