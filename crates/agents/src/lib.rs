mod error;
mod router;
mod tools;

pub use error::AgentError;
pub use router::{
    AgentConfig, AgentReply, ModelOutcome, RailAgent, ReplyKind, DEFAULT_MAX_TOOL_ROUNDS,
};
pub use tools::{SearchTool, SEARCH_TOOL_NAME};
