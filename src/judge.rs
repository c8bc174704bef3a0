//! Rubric-based grading through any [`BackendAdapter`].
//!
//! A [`Judge`] renders grading prompts, sends them to the wrapped adapter as
//! one batch, and parses each `<feedback> [RESULT] <grade>` reply. Replies that
//! do not parse are re-asked, only for the affected items, up to a fixed number
//! of attempts. Items that never parse come back with `score: None` and the
//! last raw reply as feedback.

pub mod parse;
pub mod prompts;

pub use parse::{Preference, parse_absolute, parse_relative};
pub use prompts::ScoreRubric;

use crate::api::SamplingOptions;
use crate::error::{AdapterError, Result};
use crate::traits::BackendAdapter;
use std::sync::Arc;

/// Default number of times a prompt is sent before giving up on parsing.
pub const DEFAULT_MAX_PARSE_ATTEMPTS: u32 = 3;

/// Feedback plus the parsed grade, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict<T> {
    pub feedback: String,
    pub score: Option<T>,
}

/// One item to grade on an absolute 1-5 scale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbsoluteRequest {
    pub instruction: String,
    pub response: String,
    /// Rendered rubric text (see [`ScoreRubric::render`]).
    pub rubric: String,
    pub reference_answer: Option<String>,
}

/// One pair of responses to compare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelativeRequest {
    pub instruction: String,
    pub response_a: String,
    pub response_b: String,
    pub rubric: String,
    pub reference_answer: Option<String>,
}

impl AbsoluteRequest {
    fn prompt(&self) -> String {
        let mut vars = vec![
            ("instruction", self.instruction.as_str()),
            ("response", self.response.as_str()),
            ("rubric", self.rubric.as_str()),
        ];
        let template = match &self.reference_answer {
            Some(reference) => {
                vars.push(("reference_answer", reference.as_str()));
                prompts::ABSOLUTE_PROMPT
            }
            None => prompts::ABSOLUTE_PROMPT_WO_REF,
        };
        prompts::render(template, &vars)
    }
}

impl RelativeRequest {
    fn prompt(&self) -> String {
        let mut vars = vec![
            ("instruction", self.instruction.as_str()),
            ("response_a", self.response_a.as_str()),
            ("response_b", self.response_b.as_str()),
            ("rubric", self.rubric.as_str()),
        ];
        let template = match &self.reference_answer {
            Some(reference) => {
                vars.push(("reference_answer", reference.as_str()));
                prompts::RELATIVE_PROMPT
            }
            None => prompts::RELATIVE_PROMPT_WO_REF,
        };
        prompts::render(template, &vars)
    }
}

/// Grades responses with a judge model behind a [`BackendAdapter`].
pub struct Judge {
    adapter: Arc<dyn BackendAdapter>,
    sampling: SamplingOptions,
    max_parse_attempts: u32,
}

impl Judge {
    /// Judge with default sampling and [`DEFAULT_MAX_PARSE_ATTEMPTS`].
    pub fn new(adapter: Arc<dyn BackendAdapter>) -> Self {
        Self {
            adapter,
            sampling: SamplingOptions::default(),
            max_parse_attempts: DEFAULT_MAX_PARSE_ATTEMPTS,
        }
    }

    /// Sampling options passed with every grading batch.
    pub fn with_sampling(mut self, sampling: SamplingOptions) -> Self {
        self.sampling = sampling;
        self
    }

    /// Number of times a prompt is sent before its reply is given up on.
    /// Values below 1 are treated as 1.
    pub fn with_max_parse_attempts(mut self, attempts: u32) -> Self {
        self.max_parse_attempts = attempts.max(1);
        self
    }

    /// Grade one response on the 1-5 scale.
    pub async fn absolute_grade(
        &self,
        instruction: &str,
        response: &str,
        rubric: &str,
        reference_answer: Option<&str>,
    ) -> Result<Verdict<u8>> {
        let request = AbsoluteRequest {
            instruction: instruction.to_string(),
            response: response.to_string(),
            rubric: rubric.to_string(),
            reference_answer: reference_answer.map(str::to_string),
        };
        let mut verdicts = self.absolute_grade_batch(&[request]).await?;
        verdicts
            .pop()
            .ok_or_else(|| AdapterError::MalformedResponse("Judge returned no verdict".into()))
    }

    /// Pick the better of two responses.
    pub async fn relative_grade(
        &self,
        instruction: &str,
        response_a: &str,
        response_b: &str,
        rubric: &str,
        reference_answer: Option<&str>,
    ) -> Result<Verdict<Preference>> {
        let request = RelativeRequest {
            instruction: instruction.to_string(),
            response_a: response_a.to_string(),
            response_b: response_b.to_string(),
            rubric: rubric.to_string(),
            reference_answer: reference_answer.map(str::to_string),
        };
        let mut verdicts = self.relative_grade_batch(&[request]).await?;
        verdicts
            .pop()
            .ok_or_else(|| AdapterError::MalformedResponse("Judge returned no verdict".into()))
    }

    /// Grade a batch on the 1-5 scale. Output order matches input order.
    pub async fn absolute_grade_batch(
        &self,
        requests: &[AbsoluteRequest],
    ) -> Result<Vec<Verdict<u8>>> {
        let prompts = requests.iter().map(AbsoluteRequest::prompt).collect();
        self.grade(prompts, parse_absolute).await
    }

    /// Compare a batch of response pairs. Output order matches input order.
    pub async fn relative_grade_batch(
        &self,
        requests: &[RelativeRequest],
    ) -> Result<Vec<Verdict<Preference>>> {
        let prompts = requests.iter().map(RelativeRequest::prompt).collect();
        self.grade(prompts, parse_relative).await
    }

    async fn grade<T>(
        &self,
        prompts: Vec<String>,
        parse: fn(&str) -> Option<(String, T)>,
    ) -> Result<Vec<Verdict<T>>> {
        let mut parsed: Vec<Option<(String, T)>> = prompts.iter().map(|_| None).collect();
        let mut last_raw = vec![String::new(); prompts.len()];
        let mut pending: Vec<usize> = (0..prompts.len()).collect();

        for attempt in 1..=self.max_parse_attempts {
            if pending.is_empty() {
                break;
            }
            let batch: Vec<String> = pending.iter().map(|&i| prompts[i].clone()).collect();
            let outputs = self.adapter.completions(&batch, &self.sampling).await?;
            if outputs.len() != batch.len() {
                return Err(AdapterError::MalformedResponse(format!(
                    "Judge backend returned {} completions for {} prompts",
                    outputs.len(),
                    batch.len()
                )));
            }

            let mut unparsed = Vec::new();
            for (&i, output) in pending.iter().zip(outputs) {
                match parse(&output) {
                    Some(verdict) => parsed[i] = Some(verdict),
                    None => {
                        last_raw[i] = output;
                        unparsed.push(i);
                    }
                }
            }

            if !unparsed.is_empty() {
                tracing::warn!(
                    attempt,
                    max_attempts = self.max_parse_attempts,
                    unparsed = unparsed.len(),
                    "Judge replies without a parseable [RESULT]"
                );
            }
            pending = unparsed;
        }

        Ok(parsed
            .into_iter()
            .zip(last_raw)
            .map(|(verdict, raw)| match verdict {
                Some((feedback, score)) => Verdict {
                    feedback,
                    score: Some(score),
                },
                None => Verdict {
                    feedback: raw.trim().to_string(),
                    score: None,
                },
            })
            .collect())
    }
}
