//! Multiple-choice questions parsed from model output.
//!
//! The model is asked for blocks like:
//!
//! ```text
//! Q1. Which of these is a set?
//! A. The collection of good books
//! B. The collection of vowels
//! C. The collection of tall students
//! D. The collection of easy problems
//! Answer: B
//! ```
//!
//! Parsing is a line-oriented scan. Blocks that do not end up with four
//! options and a valid answer letter are dropped without notice.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const OPTION_PREFIXES: [&str; 4] = ["A.", "B.", "C.", "D."];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Choice {
    A,
    B,
    C,
    D,
}

impl Choice {
    pub fn as_str(&self) -> &'static str {
        match self {
            Choice::A => "A",
            Choice::B => "B",
            Choice::C => "C",
            Choice::D => "D",
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Choice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(Choice::A),
            "B" => Ok(Choice::B),
            "C" => Ok(Choice::C),
            "D" => Ok(Choice::D),
            other => Err(format!("'{other}' is not one of A, B, C, D")),
        }
    }
}

/// A question with four labelled options, in the order the model wrote them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mcq {
    pub question: String,
    pub options: [String; 4],
    pub correct: Choice,
}

/// Result of checking a selected option against an [`Mcq`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerFeedback {
    pub correct: bool,
    pub expected: Choice,
    pub message: String,
}

impl Mcq {
    /// Checks a selected option such as `"B. The collection of vowels"`.
    /// The label is the text before the first `.`, upper-cased.
    pub fn check(&self, selected: &str) -> AnswerFeedback {
        let chosen = selected
            .split('.')
            .next()
            .unwrap_or_default()
            .trim()
            .to_uppercase();
        let correct = chosen == self.correct.as_str();

        let message = if correct {
            "Correct answer!".to_string()
        } else {
            format!("Incorrect. Correct answer is {}", self.correct)
        };

        AnswerFeedback {
            correct,
            expected: self.correct,
            message,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum LineKind {
    QuestionStart,
    Option,
    Answer(String),
    Other,
}

fn classify(line: &str) -> LineKind {
    let lower = line.to_lowercase();

    if lower.starts_with('q') {
        LineKind::QuestionStart
    } else if OPTION_PREFIXES.iter().any(|prefix| line.starts_with(prefix)) {
        LineKind::Option
    } else if lower.contains("answer") {
        let token = line
            .split_whitespace()
            .last()
            .unwrap_or_default()
            .replace('.', "")
            .to_uppercase();
        LineKind::Answer(token)
    } else {
        LineKind::Other
    }
}

#[derive(Debug, Default)]
struct Draft {
    question: String,
    options: Vec<String>,
    correct: String,
}

impl Draft {
    fn named(question: &str) -> Self {
        Self {
            question: question.to_string(),
            ..Self::default()
        }
    }

    fn apply(&mut self, line: &str, kind: LineKind) {
        match kind {
            LineKind::Option => self.options.push(line.to_string()),
            LineKind::Answer(token) => self.correct = token,
            LineKind::QuestionStart | LineKind::Other => {}
        }
    }

    fn finish(self) -> Option<Mcq> {
        if self.correct.is_empty() {
            return None;
        }
        let correct = match self.correct.parse::<Choice>() {
            Ok(choice) => choice,
            Err(reason) => {
                tracing::debug!(question = %self.question, "Dropping MCQ: {}", reason);
                return None;
            }
        };
        let options: [String; 4] = self.options.try_into().ok()?;

        Some(Mcq {
            question: self.question,
            options,
            correct,
        })
    }
}

/// Scan state. Option and answer lines seen before the first question line
/// collect in an unnamed draft which that question line then names.
enum ParserState {
    Unnamed(Draft),
    InRecord(Draft),
}

/// Parses raw model output into MCQs, keeping input order.
pub fn parse_mcqs(raw: &str) -> Vec<Mcq> {
    let mut drafts = Vec::new();
    let mut state = ParserState::Unnamed(Draft::default());

    for line in raw.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let kind = classify(line);

        state = match (state, kind) {
            (ParserState::Unnamed(mut draft), LineKind::QuestionStart) => {
                draft.question = line.to_string();
                ParserState::InRecord(draft)
            }
            (ParserState::InRecord(draft), LineKind::QuestionStart) => {
                drafts.push(draft);
                ParserState::InRecord(Draft::named(line))
            }
            (ParserState::Unnamed(mut draft), kind) => {
                draft.apply(line, kind);
                ParserState::Unnamed(draft)
            }
            (ParserState::InRecord(mut draft), kind) => {
                draft.apply(line, kind);
                ParserState::InRecord(draft)
            }
        };
    }

    if let ParserState::InRecord(draft) = state {
        drafts.push(draft);
    }

    let total = drafts.len();
    let mcqs: Vec<Mcq> = drafts.into_iter().filter_map(Draft::finish).collect();
    if mcqs.len() < total {
        tracing::debug!("Dropped {} malformed MCQ blocks", total - mcqs.len());
    }
    mcqs
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = "Q1. Which of the following is a set?
A. The collection of good books
B. The collection of vowels in English
C. The collection of tall students
D. The collection of difficult problems
Answer: B";

    #[test]
    fn test_well_formed_block() {
        let mcqs = parse_mcqs(WELL_FORMED);
        assert_eq!(mcqs.len(), 1);

        let mcq = &mcqs[0];
        assert_eq!(mcq.question, "Q1. Which of the following is a set?");
        assert_eq!(mcq.correct, Choice::B);
        assert!(mcq.options[0].starts_with("A."));
        assert!(mcq.options[1].starts_with("B."));
        assert!(mcq.options[2].starts_with("C."));
        assert!(mcq.options[3].starts_with("D."));
    }

    #[test]
    fn test_missing_option_drops_block() {
        let text = "Q1. What is {1,2} ∩ {2,3}?
A. {2}
B. {1,2,3}
D. {}
Answer: A";
        assert!(parse_mcqs(text).is_empty());
    }

    #[test]
    fn test_last_answer_line_wins() {
        let text = format!("{WELL_FORMED}\nAnswer: D.");
        let mcqs = parse_mcqs(&text);
        assert_eq!(mcqs.len(), 1);
        assert_eq!(mcqs[0].correct, Choice::D);
    }

    #[test]
    fn test_multiple_blocks_keep_order_and_skip_bad_ones() {
        let text = "Q1. First?
A. a
B. b
C. c
D. d
Answer: A

Q2. Second, missing answer?
A. a
B. b
C. c
D. d

Q3. Third?
A. a
B. b
C. c
D. d
The correct answer is c.";
        let mcqs = parse_mcqs(text);
        assert_eq!(mcqs.len(), 2);
        assert_eq!(mcqs[0].question, "Q1. First?");
        assert_eq!(mcqs[0].correct, Choice::A);
        assert_eq!(mcqs[1].question, "Q3. Third?");
        assert_eq!(mcqs[1].correct, Choice::C);
    }

    #[test]
    fn test_invalid_answer_letter_is_rejected() {
        let text = WELL_FORMED.replace("Answer: B", "Answer: E");
        assert!(parse_mcqs(&text).is_empty());

        let text = WELL_FORMED.replace("Answer: B", "Answer: B) vowels");
        assert!(parse_mcqs(&text).is_empty());
    }

    #[test]
    fn test_lowercase_question_prefix_and_answer_keyword() {
        let text = "question 1: is ∅ a subset of every set?
A. Yes
B. No
C. Only of finite sets
D. Only of itself
correct ANSWER: a";
        let mcqs = parse_mcqs(text);
        assert_eq!(mcqs.len(), 1);
        assert_eq!(mcqs[0].correct, Choice::A);
    }

    #[test]
    fn test_extra_option_lines_drop_block() {
        let text = WELL_FORMED.replace("Answer: B", "A. duplicate\nAnswer: B");
        assert!(parse_mcqs(&text).is_empty());
    }

    #[test]
    fn test_options_before_first_question_join_it() {
        let text = format!("A. stray option\n{WELL_FORMED}");
        assert!(parse_mcqs(&text).is_empty());
    }

    #[test]
    fn test_lines_without_question_emit_nothing() {
        let text = "A. a\nB. b\nC. c\nD. d\nAnswer: A";
        assert!(parse_mcqs(text).is_empty());
        assert!(parse_mcqs("").is_empty());
        assert!(parse_mcqs("Here are your questions:").is_empty());
    }

    #[test]
    fn test_indented_lines_are_trimmed() {
        let text = WELL_FORMED
            .lines()
            .map(|line| format!("   {line}  "))
            .collect::<Vec<_>>()
            .join("\n");
        assert_eq!(parse_mcqs(&text).len(), 1);
    }

    #[test]
    fn test_classify_precedence() {
        assert_eq!(classify("Q2. What is the answer?"), LineKind::QuestionStart);
        assert_eq!(classify("A. answer set"), LineKind::Option);
        assert_eq!(classify("Answer: c."), LineKind::Answer("C".to_string()));
        assert_eq!(classify("A) missing dot"), LineKind::Other);
    }

    #[test]
    fn test_check_feedback() {
        let mcq = parse_mcqs(WELL_FORMED).remove(0);

        let right = mcq.check("B. The collection of vowels in English");
        assert!(right.correct);
        assert_eq!(right.message, "Correct answer!");

        let lowercase = mcq.check("b");
        assert!(lowercase.correct);

        let wrong = mcq.check("A. The collection of good books");
        assert!(!wrong.correct);
        assert_eq!(wrong.expected, Choice::B);
        assert_eq!(wrong.message, "Incorrect. Correct answer is B");
    }

    #[test]
    fn test_choice_round_trips_through_json() {
        let json = serde_json::to_string(&Choice::C).unwrap();
        assert_eq!(json, "\"C\"");
        assert_eq!(serde_json::from_str::<Choice>(&json).unwrap(), Choice::C);
        assert!("E".parse::<Choice>().is_err());
    }
}
