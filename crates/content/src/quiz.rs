//! Multiple-choice quiz generation from key points.

use std::collections::{BTreeMap, HashMap};

use sb_domain::quiz::{AnswerChoice, Quiz, QuizQuestion};
use sb_providers::{GenerateRequest, LlmProvider};
use serde::Deserialize;

use crate::outcome::Outcome;

/// Questions kept per quiz.
pub const QUESTIONS_PER_QUIZ: usize = 3;

const SYSTEM: &str = "You write short multiple-choice quizzes that check whether a \
                      student remembers the key points of what they just studied.";

/// The single question used when generation fails.
pub fn fallback_quiz() -> Quiz {
    let options = [
        (AnswerChoice::A, "Mathematics"),
        (AnswerChoice::B, "Science"),
        (AnswerChoice::C, "Literature"),
        (AnswerChoice::D, "History"),
    ]
    .into_iter()
    .map(|(c, text)| (c, text.to_string()))
    .collect();

    Quiz::new(vec![QuizQuestion {
        question: "What is the main topic being studied?".into(),
        options,
        correct_answer: AnswerChoice::A,
    }])
}

pub(crate) fn build_request(key_points: &[String]) -> GenerateRequest {
    let points = key_points
        .iter()
        .map(|p| format!("- {p}"))
        .collect::<Vec<_>>()
        .join("\n");
    GenerateRequest {
        system: Some(SYSTEM.to_string()),
        prompt: format!(
            "Write {QUESTIONS_PER_QUIZ} multiple-choice questions based on these key points:\n\
             {points}\n\n\
             Respond with a JSON array only. Each element must look like:\n\
             {{\"question\": \"...\", \"options\": {{\"A\": \"...\", \"B\": \"...\", \
             \"C\": \"...\", \"D\": \"...\"}}, \"correct_answer\": \"A\"}}"
        ),
        temperature: Some(0.5),
        max_tokens: Some(1024),
        json_mode: true,
    }
}

#[derive(Debug, Deserialize)]
struct WireQuestion {
    question: String,
    options: HashMap<String, String>,
    correct_answer: String,
}

impl WireQuestion {
    /// Convert to a domain question; `None` unless all four options and a
    /// valid correct letter are present.
    fn into_question(self) -> Option<QuizQuestion> {
        if self.question.trim().is_empty() {
            return None;
        }
        let mut options = BTreeMap::new();
        for (key, text) in self.options {
            if let Ok(choice) = key.parse::<AnswerChoice>() {
                options.insert(choice, text.trim().to_string());
            }
        }
        if options.len() != AnswerChoice::ALL.len() {
            return None;
        }
        let correct_answer = self.correct_answer.parse().ok()?;
        Some(QuizQuestion {
            question: self.question.trim().to_string(),
            options,
            correct_answer,
        })
    }
}

/// Parse a model response into questions. Tolerates prose or code fences
/// around the JSON array.
pub(crate) fn parse_quiz(response: &str) -> Result<Vec<QuizQuestion>, String> {
    let start = response.find('[').ok_or("no JSON array in response")?;
    let end = response.rfind(']').ok_or("no JSON array in response")?;
    if end < start {
        return Err("no JSON array in response".into());
    }
    let wire: Vec<WireQuestion> =
        serde_json::from_str(&response[start..=end]).map_err(|e| e.to_string())?;

    let questions: Vec<QuizQuestion> = wire
        .into_iter()
        .filter_map(WireQuestion::into_question)
        .take(QUESTIONS_PER_QUIZ)
        .collect();
    if questions.is_empty() {
        return Err("response contained no well-formed questions".into());
    }
    Ok(questions)
}

pub(crate) async fn generate_quiz(
    provider: Option<&dyn LlmProvider>,
    key_points: &[String],
) -> Outcome<Quiz> {
    let Some(provider) = provider else {
        return Outcome::fallback("generate_quiz", fallback_quiz(), "no LLM provider configured");
    };

    match provider.generate(&build_request(key_points)).await {
        Ok(resp) => match parse_quiz(&resp.text) {
            Ok(questions) => Outcome::Fresh(Quiz::new(questions)),
            Err(reason) => Outcome::fallback("generate_quiz", fallback_quiz(), reason),
        },
        Err(e) => Outcome::fallback("generate_quiz", fallback_quiz(), e.to_string()),
    }
}
