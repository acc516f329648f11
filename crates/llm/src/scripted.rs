use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::chat::{ChatCompletion, ChatModel, ChatRequest};
use crate::error::{ProviderError, Result};

/// Replays canned completions in order and records every request it receives.
#[derive(Debug, Default)]
pub struct ScriptedChatModel {
    replies: Mutex<VecDeque<Result<ChatCompletion>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedChatModel {
    pub fn new(replies: impl IntoIterator<Item = ChatCompletion>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(Ok).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn push_error(&self, error: ProviderError) {
        self.replies.lock().push_back(Err(error));
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl ChatModel for ScriptedChatModel {
    fn model(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ChatRequest) -> Result<ChatCompletion> {
        self.requests.lock().push(request);
        self.replies.lock().pop_front().unwrap_or_else(|| {
            Err(ProviderError::InvalidResponse(
                "scripted model has no replies left".to_string(),
            ))
        })
    }
}
