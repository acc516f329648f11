use std::sync::Arc;

use serde_json::json;
use transit_core::{Chunk, Message, SourceTag};
use transit_llm::{ChatModel, ChatRequest, OpenAiClient, OpenAiConfig, ProviderError};
use transit_retrieval::{Embedder, RetrievalIndex};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> OpenAiClient {
    OpenAiClient::new(&OpenAiConfig {
        api_key: Some("sk-test".to_string()),
        base_url: format!("{}/v1", server.uri()),
        ..OpenAiConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn parses_tool_calls() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({ "model": "gpt-4o-mini", "tool_choice": "auto" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {
                            "name": "search_railway_info",
                            "arguments": "{\"query\": \"Howrah\"}"
                        }
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = ChatRequest::new(vec![Message::user("trains from Howrah")])
        .with_tools(vec![transit_agents::SearchTool::spec()]);
    let completion = client_for(&server).complete(request).await.unwrap();

    assert!(completion.content.is_none());
    assert_eq!(completion.tool_calls.len(), 1);
    assert_eq!(completion.tool_calls[0].id, "call_abc");
    assert_eq!(completion.tool_calls[0].arguments, "{\"query\": \"Howrah\"}");
    assert_eq!(completion.finish_reason.as_deref(), Some("tool_calls"));
}

#[tokio::test]
async fn parses_text_reply() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "READY_TO_BOOK" },
                "finish_reason": "stop"
            }]
        })))
        .mount(&server)
        .await;

    let completion = client_for(&server)
        .complete(ChatRequest::new(vec![Message::user("book it for Ravi")]))
        .await
        .unwrap();

    assert_eq!(completion.content.as_deref(), Some("READY_TO_BOOK"));
    assert!(completion.tool_calls.is_empty());
}

#[tokio::test]
async fn maps_unauthorized_to_auth_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "message": "Incorrect API key provided", "type": "invalid_request_error" }
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .complete(ChatRequest::new(vec![Message::user("hi")]))
        .await
        .unwrap_err();

    match err {
        ProviderError::Auth(message) => assert_eq!(message, "Incorrect API key provided"),
        other => panic!("expected auth error, got {other:?}"),
    }
}

#[tokio::test]
async fn maps_rate_limit_with_retry_after() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .embed_texts(&["refunds".to_string()])
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::RateLimited { retry_after_secs: 7 }));
}

#[tokio::test]
async fn maps_server_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .complete(ChatRequest::new(vec![Message::user("hi")]))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Api { status: 503, .. }));
}

#[tokio::test]
async fn embeddings_come_back_in_input_order() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .and(body_partial_json(json!({ "model": "text-embedding-ada-002" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [
                { "object": "embedding", "index": 1, "embedding": [0.0, 1.0] },
                { "object": "embedding", "index": 0, "embedding": [1.0, 0.0] }
            ]
        })))
        .mount(&server)
        .await;

    let vectors = client_for(&server)
        .embed_batch(&["first".to_string(), "second".to_string()])
        .await
        .unwrap();

    assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
}

#[tokio::test]
async fn index_build_fails_when_embeddings_fail() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let result = RetrievalIndex::build(
        vec![Chunk::new("Refunds take seven days.", SourceTag::Policy)],
        Arc::new(client_for(&server)),
    )
    .await;

    assert!(result.is_err());
}
