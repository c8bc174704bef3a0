//! Built-in grading prompt templates.
//!
//! Placeholders are written `{name}` and filled by [`render`]. The absolute
//! templates ask for "an integer between 1 and 5"; the relative templates ask
//! the judge to choose "either A or B".

use serde::{Deserialize, Serialize};

pub const ABSOLUTE_PROMPT: &str = "###Task Description:
An instruction (might include an Input inside it), a response to evaluate, a reference answer that gets a score of 5, and a score rubric representing an evaluation criterion are given.
1. Write detailed feedback that assesses the quality of the response strictly based on the given score rubric, not evaluating in general.
2. After writing the feedback, write a score that is an integer between 1 and 5. You should refer to the score rubric.
3. The output format should look as follows: \"(feedback for the criterion) [RESULT] (an integer between 1 and 5)\"
4. Do not generate any other opening, closing, or explanation.

###The instruction to evaluate:
{instruction}

###Response to evaluate:
{response}

###Reference Answer (Score 5):
{reference_answer}

###Score Rubrics:
{rubric}

###Feedback: ";

pub const ABSOLUTE_PROMPT_WO_REF: &str = "###Task Description:
An instruction (might include an Input inside it), a response to evaluate, and a score rubric representing an evaluation criterion are given.
1. Write detailed feedback that assesses the quality of the response strictly based on the given score rubric, not evaluating in general.
2. After writing the feedback, write a score that is an integer between 1 and 5. You should refer to the score rubric.
3. The output format should look as follows: \"(feedback for the criterion) [RESULT] (an integer between 1 and 5)\"
4. Do not generate any other opening, closing, or explanation.

###The instruction to evaluate:
{instruction}

###Response to evaluate:
{response}

###Score Rubrics:
{rubric}

###Feedback: ";

pub const RELATIVE_PROMPT: &str = "###Task Description:
An instruction (might include an Input inside it), two responses to evaluate (denoted as Response A and Response B), a reference answer, and an evaluation criterion are given.
1. Write detailed feedback that assesses the quality of the two responses strictly based on the given evaluation criterion, not evaluating in general.
2. Make comparisons between Response A, Response B, and the Reference Answer. Instead of examining Response A and Response B separately, go straight to the point and mention the commonalities and differences between them.
3. After writing the feedback, indicate the better response, either A or B.
4. The output format should look as follows: \"Feedback: (feedback) [RESULT] (either A or B)\"
5. Do not generate any other opening, closing, or explanation.

###Instruction:
{instruction}

###Response A:
{response_a}

###Response B:
{response_b}

###Reference Answer:
{reference_answer}

###Score Rubric:
{rubric}

###Feedback: ";

pub const RELATIVE_PROMPT_WO_REF: &str = "###Task Description:
An instruction (might include an Input inside it), two responses to evaluate (denoted as Response A and Response B), and an evaluation criterion are given.
1. Write detailed feedback that assesses the quality of the two responses strictly based on the given evaluation criterion, not evaluating in general.
2. Make comparisons between Response A and Response B. Instead of examining them separately, go straight to the point and mention the commonalities and differences between them.
3. After writing the feedback, indicate the better response, either A or B.
4. The output format should look as follows: \"Feedback: (feedback) [RESULT] (either A or B)\"
5. Do not generate any other opening, closing, or explanation.

###Instruction:
{instruction}

###Response A:
{response_a}

###Response B:
{response_b}

###Score Rubric:
{rubric}

###Feedback: ";

/// Fill `{name}` placeholders in `template` in a single pass.
///
/// Placeholder-looking text inside substituted values is left alone, so a
/// response that happens to contain `{rubric}` is not expanded.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let name = &after[..close];
            vars.iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| (*v, close))
        });
        match value {
            Some((v, close)) => {
                out.push_str(v);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// A five-level score rubric.
///
/// Deserializes from the flat shape
/// `{"criteria": ..., "score1_description": ..., ..., "score5_description": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRubric {
    pub criteria: String,
    pub score1_description: String,
    pub score2_description: String,
    pub score3_description: String,
    pub score4_description: String,
    pub score5_description: String,
}

impl ScoreRubric {
    /// Render the rubric block embedded in grading prompts.
    pub fn render(&self) -> String {
        format!(
            "[{}]\nScore 1: {}\nScore 2: {}\nScore 3: {}\nScore 4: {}\nScore 5: {}",
            self.criteria,
            self.score1_description,
            self.score2_description,
            self.score3_description,
            self.score4_description,
            self.score5_description,
        )
    }
}
