use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use transit_core::{
    canned_reply, classify_confirmation, contains_ready_marker, BookingRecord, ConfirmationIntent,
    Conversation, Message, ToolCall, SYSTEM_INSTRUCTION,
};
use transit_llm::{ChatCompletion, ChatModel, ChatRequest, ResponseFormat};
use transit_observability::{AppMetrics, Counter};
use transit_retrieval::{RetrievalIndex, DEFAULT_TOP_K};

use crate::error::AgentError;
use crate::tools::SearchTool;

pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 5;

#[derive(Debug, Clone, Copy)]
pub struct AgentConfig {
    pub top_k: usize,
    pub max_tool_rounds: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
        }
    }
}

/// What a single chat-model response asks the router to do next.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelOutcome {
    ToolRequest { content: String, calls: Vec<ToolCall> },
    ReadyToBook(String),
    PlainReply(String),
}

impl ModelOutcome {
    pub fn classify(completion: ChatCompletion) -> Self {
        let content = completion.content.unwrap_or_default();

        if !completion.tool_calls.is_empty() {
            Self::ToolRequest {
                content,
                calls: completion.tool_calls,
            }
        } else if contains_ready_marker(&content) {
            Self::ReadyToBook(content)
        } else {
            Self::PlainReply(content)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum TurnState {
    Routing,
    AwaitingToolResult(Vec<ToolCall>),
    Booking,
    Done(AgentReply),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplyKind {
    Confirmation,
    Decline,
    Answer,
    Booking(BookingRecord),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentReply {
    pub text: String,
    pub kind: ReplyKind,
    pub tool_rounds: usize,
}

impl AgentReply {
    fn new(text: String, kind: ReplyKind) -> Self {
        Self {
            text,
            kind,
            tool_rounds: 0,
        }
    }
}

/// Conversation router: canned confirmation replies, model answers with retrieval, and
/// structured booking extraction.
#[derive(Clone)]
pub struct RailAgent {
    model: Arc<dyn ChatModel>,
    search: SearchTool,
    metrics: Arc<AppMetrics>,
    config: AgentConfig,
}

impl RailAgent {
    pub fn new(
        model: Arc<dyn ChatModel>,
        index: Arc<RetrievalIndex>,
        metrics: Arc<AppMetrics>,
        config: AgentConfig,
    ) -> Self {
        Self {
            model,
            search: SearchTool::new(index, config.top_k),
            metrics,
            config,
        }
    }

    /// Handles one user line. Every message the turn produces is appended to
    /// `conversation`, including tool traffic. A failed turn leaves `conversation` exactly
    /// as it was before the call.
    #[instrument(skip(self, conversation, text), fields(session_id = %conversation.session_id))]
    pub async fn handle_turn(
        &self,
        conversation: &mut Conversation,
        text: &str,
    ) -> Result<AgentReply> {
        let checkpoint = conversation.len();

        match self.route_turn(conversation, text).await {
            Ok(reply) => Ok(reply),
            Err(err) => {
                let discarded = conversation.len() - checkpoint;
                conversation.truncate(checkpoint);
                warn!(discarded, error = %err, "turn failed, history rolled back");
                Err(err)
            }
        }
    }

    async fn route_turn(&self, conversation: &mut Conversation, text: &str) -> Result<AgentReply> {
        let started = Instant::now();
        self.metrics.incr(Counter::Turns);
        conversation.push(Message::user(text));

        let intent = classify_confirmation(text);
        if let Some(reply_text) = canned_reply(intent) {
            self.metrics.incr(Counter::CannedReplies);
            conversation.push(Message::assistant(reply_text.clone()));

            let kind = match intent {
                ConfirmationIntent::Negative => ReplyKind::Decline,
                _ => ReplyKind::Confirmation,
            };
            info!(intent = ?intent, "canned reply");
            self.metrics.observe_latency(started.elapsed());
            return Ok(AgentReply::new(reply_text, kind));
        }

        let mut tool_rounds = 0usize;
        let mut state = TurnState::Routing;

        let reply = loop {
            state = match state {
                TurnState::Routing => self.consult_model(conversation).await?,
                TurnState::AwaitingToolResult(calls) => {
                    if tool_rounds >= self.config.max_tool_rounds {
                        return Err(AgentError::ToolLoopExhausted {
                            rounds: tool_rounds,
                        }
                        .into());
                    }
                    tool_rounds += 1;
                    self.run_tools(conversation, &calls).await?;
                    TurnState::Routing
                }
                TurnState::Booking => {
                    let booking = self.extract_booking(conversation).await?;
                    let text = booking.to_string();
                    conversation.push(Message::assistant(text.clone()));
                    self.metrics.incr(Counter::Bookings);
                    TurnState::Done(AgentReply::new(text, ReplyKind::Booking(booking)))
                }
                TurnState::Done(reply) => break reply,
            };
        };

        self.metrics.observe_latency(started.elapsed());
        info!(
            tool_rounds,
            booking = matches!(reply.kind, ReplyKind::Booking(_)),
            messages = conversation.len(),
            "turn handled"
        );

        Ok(AgentReply {
            tool_rounds,
            ..reply
        })
    }

    async fn consult_model(&self, conversation: &mut Conversation) -> Result<TurnState> {
        let mut messages = Vec::with_capacity(conversation.len() + 1);
        messages.push(Message::system(SYSTEM_INSTRUCTION));
        messages.extend(conversation.messages().iter().cloned());

        let request = ChatRequest::new(messages).with_tools(vec![SearchTool::spec()]);
        self.metrics.incr(Counter::ModelCalls);
        let completion = self
            .model
            .complete(request)
            .await
            .with_context(|| format!("chat model {} failed", self.model.model()))?;

        let next = match ModelOutcome::classify(completion) {
            ModelOutcome::ToolRequest { content, calls } => {
                debug!(calls = calls.len(), "model requested tools");
                conversation.push(Message::assistant_tool_calls(content, calls.clone()));
                TurnState::AwaitingToolResult(calls)
            }
            ModelOutcome::ReadyToBook(content) => {
                conversation.push(Message::assistant(content));
                TurnState::Booking
            }
            ModelOutcome::PlainReply(content) => {
                conversation.push(Message::assistant(content.clone()));
                TurnState::Done(AgentReply::new(content, ReplyKind::Answer))
            }
        };

        Ok(next)
    }

    async fn run_tools(&self, conversation: &mut Conversation, calls: &[ToolCall]) -> Result<()> {
        self.metrics.add(Counter::ToolCalls, calls.len() as u64);

        for call in calls {
            let output = self.search.execute(call).await?;
            conversation.push(Message::tool_result(call.id.clone(), output));
        }

        Ok(())
    }

    async fn extract_booking(&self, conversation: &Conversation) -> Result<BookingRecord> {
        info!("generating booking record");

        let request = ChatRequest::new(conversation.messages().to_vec()).with_response_format(
            ResponseFormat {
                name: "ticket_booking".to_string(),
                schema: BookingRecord::json_schema(),
            },
        );
        self.metrics.incr(Counter::ModelCalls);
        let completion = self
            .model
            .complete(request)
            .await
            .context("booking extraction failed")?;

        let raw = completion.content_or_empty();
        let booking = serde_json::from_str::<BookingRecord>(raw)
            .map_err(|err| AgentError::InvalidBooking(format!("{err}: {raw}")))?;

        Ok(booking)
    }
}
