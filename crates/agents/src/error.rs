use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("model kept requesting tools after {rounds} rounds")]
    ToolLoopExhausted { rounds: usize },

    #[error("booking extraction returned an unusable record: {0}")]
    InvalidBooking(String),
}
