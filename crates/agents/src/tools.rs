use std::sync::Arc;

use anyhow::Result;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};
use transit_core::ToolCall;
use transit_llm::ToolSpec;
use transit_retrieval::RetrievalIndex;

pub const SEARCH_TOOL_NAME: &str = "search_railway_info";

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
}

/// Exposes the retrieval index to the model as `search_railway_info`.
#[derive(Clone)]
pub struct SearchTool {
    index: Arc<RetrievalIndex>,
    top_k: usize,
}

impl SearchTool {
    pub fn new(index: Arc<RetrievalIndex>, top_k: usize) -> Self {
        Self { index, top_k }
    }

    pub fn spec() -> ToolSpec {
        ToolSpec {
            name: SEARCH_TOOL_NAME.to_string(),
            description: "Search train schedules + policies.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Free-text question about trains, routes, fares or policies"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    pub async fn search(&self, query: &str) -> Result<String> {
        self.index.query(query, self.top_k).await
    }

    /// Runs one model-requested call. Bad arguments and unknown tools become an error
    /// string for the model to read; retrieval failures are returned as `Err`.
    pub async fn execute(&self, call: &ToolCall) -> Result<String> {
        if call.name != SEARCH_TOOL_NAME {
            warn!(tool = %call.name, "model requested unknown tool");
            return Ok(format!("Error: unknown tool `{}`", call.name));
        }

        let args = match serde_json::from_str::<SearchArgs>(&call.arguments) {
            Ok(args) => args,
            Err(err) => {
                warn!(arguments = %call.arguments, error = %err, "invalid search arguments");
                return Ok(format!("Error: invalid arguments for {SEARCH_TOOL_NAME}: {err}"));
            }
        };

        info!(query = %args.query, "search tool invoked");
        self.search(&args.query).await
    }
}
