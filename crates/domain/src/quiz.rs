//! Multiple-choice quiz model shared by the content pipeline, the
//! scheduler and the transports.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the four option letters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnswerChoice {
    A,
    B,
    C,
    D,
}

impl AnswerChoice {
    pub const ALL: [AnswerChoice; 4] = [Self::A, Self::B, Self::C, Self::D];

    pub fn letter(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::D => 'D',
        }
    }
}

impl fmt::Display for AnswerChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Returned when a string is not one of `A`..`D`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not an answer letter: {0:?}")]
pub struct InvalidChoice(pub String);

impl FromStr for AnswerChoice {
    type Err = InvalidChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            "D" => Ok(Self::D),
            _ => Err(InvalidChoice(s.to_owned())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: BTreeMap<AnswerChoice, String>,
    pub correct_answer: AnswerChoice,
}

/// A question set posted at the end of a work phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub questions: Vec<QuizQuestion>,
}

impl Quiz {
    pub fn new(questions: Vec<QuizQuestion>) -> Self {
        Self { questions }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Grade answers positionally. Missing answers count as wrong, extra
    /// answers are ignored.
    pub fn grade(&self, answers: &[Option<AnswerChoice>]) -> QuizScore {
        let correct = self
            .questions
            .iter()
            .zip(answers.iter())
            .filter(|(q, a)| **a == Some(q.correct_answer))
            .count();
        QuizScore {
            correct,
            total: self.questions.len(),
        }
    }
}

/// Result of one quiz phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizScore {
    pub correct: usize,
    pub total: usize,
}

impl QuizScore {
    /// A quiz nobody answered in time.
    pub fn zero(total: usize) -> Self {
        Self { correct: 0, total }
    }

    /// Fraction of correct answers in `[0.0, 1.0]`. An empty quiz scores 0.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }
}
