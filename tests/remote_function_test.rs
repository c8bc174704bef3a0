//! Tests for the remote serverless function backend

#![cfg(feature = "backend-remote-function")]

use async_trait::async_trait;
use judge_relay::api::SamplingOptions;
use judge_relay::error::{AdapterError, Result};
use judge_relay::provider::{
    RemoteFunction, RemoteFunctionAdapter, StaticResolver, WebEndpointResolver,
};
use judge_relay::traits::BackendAdapter;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn template_for(server: &MockServer) -> String {
    format!("{}/{{app}}/{{tag}}", server.uri())
}

#[tokio::test]
async fn test_unregistered_endpoint_fails_at_construction() {
    // No mocks mounted: the server answers every probe with 404.
    let server = MockServer::start().await;
    let resolver = WebEndpointResolver::with_template(template_for(&server));

    let err = RemoteFunctionAdapter::connect("prometheus-eval", "generate", &resolver)
        .await
        .err()
        .unwrap();

    match err {
        AdapterError::FunctionNotFound { tag, app } => {
            assert_eq!(tag, "generate");
            assert_eq!(app, "prometheus-eval");
        }
        other => panic!("expected FunctionNotFound, got {other}"),
    }
}

#[tokio::test]
async fn test_posts_each_prompt_and_collects_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/prometheus-eval/generate"))
        .respond_with(ResponseTemplate::new(405))
        .expect(1)
        .mount(&server)
        .await;
    for (prompt, reply) in [("q1", json!("a1")), ("q2", json!({"text": "a2"}))] {
        Mock::given(method("POST"))
            .and(path("/prometheus-eval/generate"))
            .and(body_json(json!({ "user_question": prompt })))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply))
            .expect(1)
            .mount(&server)
            .await;
    }

    let resolver = WebEndpointResolver::with_template(template_for(&server));
    let adapter = RemoteFunctionAdapter::connect("prometheus-eval", "generate", &resolver)
        .await
        .unwrap();

    let out = adapter
        .completions(
            &["q1".to_string(), "q2".to_string()],
            &SamplingOptions::new().with("temperature", 0.2),
        )
        .await
        .unwrap();

    assert_eq!(out, vec!["a1", "a2"]);
}

#[tokio::test]
async fn test_failed_call_aborts_batch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(405))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let resolver = WebEndpointResolver::with_template(template_for(&server));
    let adapter = RemoteFunctionAdapter::connect("app", "gen", &resolver)
        .await
        .unwrap();

    let err = adapter
        .completions(&["q".to_string()], &SamplingOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AdapterError::Api(_)));
}

struct Failing;

#[async_trait]
impl RemoteFunction for Failing {
    async fn call(&self, prompt: &str) -> Result<String> {
        if prompt == "boom" {
            Err(AdapterError::Api("remote call failed".to_string()))
        } else {
            Ok(format!("ok:{prompt}"))
        }
    }
}

#[tokio::test]
async fn test_static_resolver_and_batch_abort() {
    let resolver = StaticResolver::new().register("app", "gen", Arc::new(Failing));
    let adapter = RemoteFunctionAdapter::connect("app", "gen", &resolver)
        .await
        .unwrap();

    let ok = adapter
        .generate(&["a".to_string()], &SamplingOptions::default())
        .await
        .unwrap();
    assert_eq!(ok[0].text, "ok:a");

    let err = adapter
        .generate(
            &["a".to_string(), "boom".to_string(), "c".to_string()],
            &SamplingOptions::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AdapterError::Api(_)));
}
