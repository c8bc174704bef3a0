use criterion::{Criterion, criterion_group, criterion_main};
use judge_relay::api::{BackendConfig, BackendSpec, SamplingOptions};
use judge_relay::factory::build_adapter;
use judge_relay::judge::{parse_absolute, parse_relative};
use judge_relay::provider::MockAdapter;
use judge_relay::traits::BackendAdapter;
use tokio::runtime::Runtime;

fn prompts(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| match i % 3 {
            0 => format!("Prompt {i}: choose either A or B"),
            1 => format!("Prompt {i}: an integer between 1 and 5"),
            _ => format!("Prompt {i}: free text"),
        })
        .collect()
}

fn bench_adapter_overhead(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let batch = prompts(64);
    let options = SamplingOptions::default();

    let bare = MockAdapter::new();
    let instrumented = rt
        .block_on(build_adapter(&BackendSpec::new("bench/mock", BackendConfig::Mock)))
        .unwrap();

    c.bench_function("mock_completions_64_bare", |b| {
        b.to_async(&rt).iter(|| async {
            let _ = bare.completions(&batch, &options).await.unwrap();
        })
    });

    c.bench_function("mock_completions_64_instrumented", |b| {
        b.to_async(&rt).iter(|| async {
            let _ = instrumented.completions(&batch, &options).await.unwrap();
        })
    });
}

fn bench_reply_parsing(c: &mut Criterion) {
    let feedback = "The response acknowledges the user's feelings but offers little guidance. "
        .repeat(20);
    let absolute = format!("{feedback}[RESULT] 3");
    let relative = format!("Feedback: {feedback}[RESULT] B");

    c.bench_function("parse_absolute", |b| b.iter(|| parse_absolute(&absolute)));
    c.bench_function("parse_relative", |b| b.iter(|| parse_relative(&relative)));
}

criterion_group!(benches, bench_adapter_overhead, bench_reply_parsing);
criterion_main!(benches);
