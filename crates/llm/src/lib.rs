mod chat;
mod error;
mod hashing;
mod openai;
mod scripted;

pub use chat::{ChatCompletion, ChatModel, ChatRequest, ResponseFormat, ToolSpec};
pub use error::{ProviderError, Result};
pub use hashing::HashEmbedder;
pub use openai::{
    OpenAiClient, OpenAiConfig, DEFAULT_BASE_URL, DEFAULT_CHAT_MODEL, DEFAULT_EMBEDDING_MODEL,
    DEFAULT_TIMEOUT_SECS,
};
pub use scripted::ScriptedChatModel;
