//! Grade a response with the rubric judge over the deterministic mock backend.
//!
//! Run with:
//! ```sh
//! cargo run --example mock_judge
//! ```

use judge_relay::api::{BackendConfig, BackendSpec};
use judge_relay::factory::build_adapter;
use judge_relay::judge::{Judge, ScoreRubric};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Pick a backend; swap the config for a real judge model.
    let adapter = build_adapter(&BackendSpec::new("judge/mock", BackendConfig::Mock)).await?;

    // 2. Describe what is being graded
    let rubric = ScoreRubric {
        criteria: "Is the model proficient in applying empathy and emotional intelligence?"
            .to_string(),
        score1_description: "Fails to identify or react to the emotional tone.".to_string(),
        score2_description: "Sometimes acknowledges emotion but lacks empathy.".to_string(),
        score3_description: "Typically empathetic, occasionally off the mark.".to_string(),
        score4_description: "Consistently empathetic with sporadic lapses.".to_string(),
        score5_description: "Excels at empathetic, emotionally aware replies.".to_string(),
    };

    // 3. Grade
    let judge = Judge::new(adapter);
    let verdict = judge
        .absolute_grade(
            "After a breakup I feel lonely and sad. How do I cope and move on?",
            "Just get over it.",
            &rubric.render(),
            Some("I can only imagine how hard this is. Let yourself feel it, lean on people you trust, and take it one day at a time."),
        )
        .await?;

    println!("Feedback: {}", verdict.feedback);
    match verdict.score {
        Some(score) => println!("Score: {score}"),
        None => println!("Score: unparseable"),
    }
    Ok(())
}
