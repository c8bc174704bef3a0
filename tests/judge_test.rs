//! Tests for rubric grading through the adapter layer

use judge_relay::api::{BackendConfig, BackendSpec};
use judge_relay::factory::build_adapter;
use judge_relay::judge::{AbsoluteRequest, Judge, Preference, RelativeRequest, ScoreRubric};

fn rubric() -> ScoreRubric {
    serde_json::from_value(serde_json::json!({
        "criteria": "Does the model respond with empathy when the user shares difficult emotions?",
        "score1_description": "Ignores the emotional tone entirely.",
        "score2_description": "Occasionally acknowledges emotion but lacks empathy.",
        "score3_description": "Usually empathetic, sometimes off target.",
        "score4_description": "Consistently empathetic with minor lapses.",
        "score5_description": "Deeply empathetic and emotionally aware throughout."
    }))
    .unwrap()
}

async fn mock_judge() -> Judge {
    let adapter = build_adapter(&BackendSpec::new("judge/mock", BackendConfig::Mock))
        .await
        .unwrap();
    Judge::new(adapter)
}

#[tokio::test]
async fn test_single_absolute_grade() -> anyhow::Result<()> {
    let judge = mock_judge().await;
    let verdict = judge
        .absolute_grade(
            "After a breakup I feel lonely. How do I move on?",
            "Deal with it.",
            &rubric().render(),
            Some("I'm sorry you're going through this. Let yourself feel it..."),
        )
        .await?;

    assert_eq!(verdict.feedback, "Hello");
    assert_eq!(verdict.score, Some(5));
    Ok(())
}

#[tokio::test]
async fn test_absolute_batch_preserves_order() -> anyhow::Result<()> {
    let judge = mock_judge().await;
    let requests: Vec<AbsoluteRequest> = (0..4)
        .map(|i| AbsoluteRequest {
            instruction: format!("instruction {i}"),
            response: format!("response {i}"),
            rubric: rubric().render(),
            reference_answer: (i % 2 == 0).then(|| format!("reference {i}")),
        })
        .collect();

    let verdicts = judge.absolute_grade_batch(&requests).await?;
    assert_eq!(verdicts.len(), 4);
    assert!(verdicts.iter().all(|v| v.score == Some(5)));
    Ok(())
}

#[tokio::test]
async fn test_relative_batch() -> anyhow::Result<()> {
    let judge = mock_judge().await;
    let request = RelativeRequest {
        instruction: "Comfort me.".into(),
        response_a: "I'm here for you.".into(),
        response_b: "Whatever.".into(),
        rubric: rubric().render(),
        reference_answer: None,
    };
    let verdicts = judge
        .relative_grade_batch(&[request.clone(), request])
        .await?;

    assert_eq!(verdicts.len(), 2);
    assert!(verdicts.iter().all(|v| v.score == Some(Preference::A)));
    Ok(())
}

#[tokio::test]
async fn test_empty_batch() -> anyhow::Result<()> {
    let judge = mock_judge().await;
    assert!(judge.absolute_grade_batch(&[]).await?.is_empty());
    Ok(())
}
