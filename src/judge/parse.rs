//! Parsing of judge replies of the form `<feedback> [RESULT] <grade>`.

use serde::{Deserialize, Serialize};

/// Marker separating feedback from the grade.
pub const RESULT_MARKER: &str = "[RESULT]";

/// Lowest and highest absolute score.
pub const SCORE_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

/// The preferred response in a relative grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Preference {
    A,
    B,
}

impl std::fmt::Display for Preference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

/// Split at the last marker into trimmed feedback and the text after it.
fn split_result(output: &str) -> Option<(String, &str)> {
    let idx = output.rfind(RESULT_MARKER)?;
    let feedback = output[..idx].trim();
    let feedback = feedback
        .strip_prefix("Feedback:")
        .map(str::trim_start)
        .unwrap_or(feedback);
    Some((feedback.to_string(), output[idx + RESULT_MARKER.len()..].trim()))
}

/// Tokens after the marker with surrounding punctuation removed.
fn grade_tokens(tail: &str) -> impl Iterator<Item = &str> {
    tail.split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_ascii_alphanumeric()))
        .filter(|t| !t.is_empty())
}

/// Parse an absolute grade from the first token after the marker.
///
/// The token must be a whole number in [`SCORE_RANGE`] once surrounding
/// punctuation is removed, so `4`, `(4)` and `4.` read as 4. The out-of-five
/// form `3/5` reads as 3. Anything else, such as `4.5` or `3/4`, is rejected.
pub fn parse_absolute(output: &str) -> Option<(String, u8)> {
    let (feedback, tail) = split_result(output)?;
    let token = grade_tokens(tail).next()?;
    let digits = match token.split_once('/') {
        Some((score, "5")) => score,
        Some(_) => return None,
        None => token,
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let score: u8 = digits.parse().ok()?;
    SCORE_RANGE.contains(&score).then_some((feedback, score))
}

/// Parse a relative grade. Accepts `A`/`B` in either case, optionally preceded
/// by the word `Response`. A tail that names both `A` and `B` (an echoed
/// `either A or B`) is rejected.
pub fn parse_relative(output: &str) -> Option<(String, Preference)> {
    let (feedback, tail) = split_result(output)?;
    let mut tokens = grade_tokens(tail);
    let mut token = tokens.next()?;
    if token.eq_ignore_ascii_case("response") {
        token = tokens.next()?;
    }
    let preference = match token {
        "A" | "a" => Preference::A,
        "B" | "b" => Preference::B,
        _ => return None,
    };
    let other = match preference {
        Preference::A => "B",
        Preference::B => "A",
    };
    if grade_tokens(tail).any(|t| t == other) {
        return None;
    }
    Some((feedback, preference))
}
