use std::fs;
use std::path::Path;
use std::sync::Arc;

use transit_agents::{AgentConfig, RailAgent, ReplyKind};
use transit_core::{Conversation, SourceTag, ToolCall, DECLINE_REPLY};
use transit_llm::{ChatCompletion, HashEmbedder, ScriptedChatModel};
use transit_observability::AppMetrics;
use transit_retrieval::{
    load, DocumentSources, Embedder, RetrievalIndex, TextSplitter, NOT_INITIALIZED,
};

const POLICIES: &str = "Cancellation policy\n\n\
Tickets cancelled more than 48 hours before departure are refunded after deducting a flat clerkage fee. \
Tickets cancelled between 48 and 12 hours before departure lose 25 percent of the fare.\n\n\
Tatkal policy\n\n\
Tatkal booking opens at 10 AM for AC classes and 11 AM for sleeper class, one day before the journey. \
Confirmed Tatkal tickets are not refunded.\n\n\
Luggage policy\n\n\
Each passenger in sleeper class may carry 40 kg free of charge. AC first class passengers may carry 70 kg.";

const SCHEDULE: &str = r#"[
  {"name": "Rajdhani Express", "train_no": "12301", "source": "Howrah", "destination": "New Delhi", "price": 2450, "class": "3A", "days": "Daily"},
  {"name": "Chennai Mail", "train_no": 12839, "source": "Howrah", "destination": "Chennai", "price": 780, "class": "SL", "days": ["Mon", "Wed", "Sat"]}
]"#;

fn sources(dir: &Path, schedule: bool, policies: bool) -> DocumentSources {
    let schedule_path = dir.join("train_data.json");
    let policy_path = dir.join("policies.txt");
    if schedule {
        fs::write(&schedule_path, SCHEDULE).unwrap();
    }
    if policies {
        fs::write(&policy_path, POLICIES).unwrap();
    }
    DocumentSources {
        schedule_path,
        policy_path,
    }
}

fn hash_embedder() -> anyhow::Result<Arc<dyn Embedder>> {
    Ok(Arc::new(HashEmbedder::default()))
}

async fn agent_over(sources: &DocumentSources, model: Arc<ScriptedChatModel>) -> RailAgent {
    let index = RetrievalIndex::from_sources(sources, hash_embedder)
        .await
        .unwrap();
    RailAgent::new(model, Arc::new(index), AppMetrics::shared(), AgentConfig::default())
}

#[tokio::test]
async fn yes_links_the_booking_portal() {
    let dir = tempfile::tempdir().unwrap();
    let model = Arc::new(ScriptedChatModel::default());
    let agent = agent_over(&sources(dir.path(), true, true), model.clone()).await;
    let mut conversation = Conversation::new();

    let reply = agent.handle_turn(&mut conversation, "yes").await.unwrap();
    assert!(reply.text.contains("https://www.irctc.co.in/nget/train-search"));
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn no_gets_the_decline_text() {
    let dir = tempfile::tempdir().unwrap();
    let model = Arc::new(ScriptedChatModel::default());
    let agent = agent_over(&sources(dir.path(), true, true), model.clone()).await;
    let mut conversation = Conversation::new();

    let reply = agent.handle_turn(&mut conversation, "no").await.unwrap();
    assert_eq!(reply.text, DECLINE_REPLY);
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn policy_only_index_answers_policy_queries() {
    let dir = tempfile::tempdir().unwrap();
    let sources = sources(dir.path(), false, true);

    let chunks = load(&sources, &TextSplitter::default()).unwrap();
    assert!(!chunks.is_empty());
    assert!(chunks.iter().all(|c| c.source_tag == SourceTag::Policy));

    let index = RetrievalIndex::build(chunks, Arc::new(HashEmbedder::default()))
        .await
        .unwrap();
    let stats = index.stats();
    assert_eq!(stats.schedule_chunks, 0);
    assert!(stats.policy_chunks > 0);

    let text = index
        .query("when does tatkal booking open", 3)
        .await
        .unwrap();
    assert_ne!(text, NOT_INITIALIZED);
    assert!(text.contains("Tatkal"));
}

#[tokio::test]
async fn no_sources_leave_the_index_uninitialized() {
    let dir = tempfile::tempdir().unwrap();
    let index = RetrievalIndex::from_sources(
        &sources(dir.path(), false, false),
        hash_embedder,
    )
    .await
    .unwrap();

    assert_eq!(index.query("refunds", 3).await.unwrap(), NOT_INITIALIZED);
}

#[tokio::test]
async fn full_booking_flow_across_turns() {
    let dir = tempfile::tempdir().unwrap();
    let model = Arc::new(ScriptedChatModel::new([
        ChatCompletion::tool_calls(vec![ToolCall {
            id: "call_a".to_string(),
            name: "search_railway_info".to_string(),
            arguments: r#"{"query": "Howrah to New Delhi"}"#.to_string(),
        }]),
        ChatCompletion::text(
            "Rajdhani Express (12301) runs daily from Howrah to New Delhi in 3A for 2450. Shall I book it? What is the passenger name?",
        ),
        ChatCompletion::text("READY_TO_BOOK"),
        ChatCompletion::text(
            serde_json::json!({
                "train_name": "Rajdhani Express",
                "source": "Howrah",
                "destination": "New Delhi",
                "passenger_name": "Meera Iyer",
                "class_type": "3A"
            })
            .to_string(),
        ),
    ]));
    let agent = agent_over(&sources(dir.path(), true, true), model.clone()).await;
    let mut conversation = Conversation::new();

    let first = agent
        .handle_turn(&mut conversation, "Any train from Howrah to New Delhi?")
        .await
        .unwrap();
    assert_eq!(first.kind, ReplyKind::Answer);
    assert_eq!(first.tool_rounds, 1);

    let requests = model.requests();
    let tool_result = &requests[1]
        .messages
        .iter()
        .find(|m| m.tool_call_id.as_deref() == Some("call_a"))
        .unwrap()
        .content;
    assert!(tool_result.contains("Rajdhani Express"));

    let second = agent
        .handle_turn(&mut conversation, "Passenger name is Meera Iyer")
        .await
        .unwrap();
    assert_eq!(
        second.text,
        "train_name='Rajdhani Express' source='Howrah' destination='New Delhi' passenger_name='Meera Iyer' class_type='3A'"
    );

    // The second turn sees the whole first turn, tool traffic included.
    let requests = model.requests();
    let third_request = &requests[2];
    assert!(third_request
        .messages
        .iter()
        .any(|m| m.content == "Any train from Howrah to New Delhi?"));
    assert!(third_request
        .messages
        .iter()
        .any(|m| m.tool_call_id.as_deref() == Some("call_a")));
}
