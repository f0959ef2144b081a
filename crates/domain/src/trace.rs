use serde::Serialize;

/// Structured trace events emitted across all StudyBuddy crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    SessionStarted {
        user_id: String,
        community_id: String,
        session_id: String,
        cycles: u32,
        key_points: usize,
    },
    StartRejected {
        user_id: String,
        reason: String,
    },
    PhaseEntered {
        session_id: String,
        phase: String,
        cycle: u32,
    },
    QuizScored {
        session_id: String,
        cycle: u32,
        correct: usize,
        total: usize,
        timed_out: bool,
    },
    SessionFinished {
        session_id: String,
        outcome: String,
        cycles_scored: usize,
        elapsed_secs: u64,
    },
    InterruptRaised {
        user_id: String,
        community_id: String,
        reason: String,
    },
    LlmRequest {
        provider: String,
        model: String,
        purpose: String,
        duration_ms: u64,
        prompt_tokens: Option<u32>,
        completion_tokens: Option<u32>,
    },
    CollaboratorFallback {
        collaborator: String,
        reason: String,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "sb_event");
    }
}
