use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTag {
    Schedule,
    Policy,
}

/// Unit of indexed text. Never mutated after the loader creates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub source_tag: SourceTag,
}

impl Chunk {
    pub fn new(text: impl Into<String>, source_tag: SourceTag) -> Self {
        Self {
            text: text.into(),
            source_tag,
        }
    }
}

/// One entry of the schedule file. `train_no`, `price` and `days` are kept as raw JSON
/// because timetables in the wild mix numbers, strings and lists for them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainRecord {
    pub name: String,
    pub train_no: Value,
    pub source: String,
    pub destination: String,
    pub price: Value,
    pub class: String,
    pub days: Value,
}

impl TrainRecord {
    pub fn describe(&self) -> String {
        format!(
            "Train {} ({}) travels from {} to {}. Price: {}. Class: {}. Days: {}.",
            self.name,
            value_to_text(&self.train_no),
            self.source,
            self.destination,
            value_to_text(&self.price),
            self.class,
            value_to_text(&self.days),
        )
    }
}

pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(v) => v.to_string(),
        Value::Number(v) => v.to_string(),
        Value::String(v) => v.clone(),
        Value::Array(values) => values
            .iter()
            .map(value_to_text)
            .filter(|v| !v.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{}: {}", k, value_to_text(v)))
            .collect::<Vec<_>>()
            .join(", "),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// JSON-encoded argument object exactly as the model produced it.
    pub arguments: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    pub fn assistant_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::with_role(Role::Assistant, content)
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::with_role(Role::Tool, content)
        }
    }
}

/// Message log for one interactive session. Only grows, except that a failed turn is
/// rolled back with [`Conversation::truncate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub session_id: String,
    messages: Vec<Message>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            messages: Vec::new(),
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Drops every message after the first `len`.
    pub fn truncate(&mut self, len: usize) {
        self.messages.truncate(len);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub train_name: String,
    pub source: String,
    pub destination: String,
    pub passenger_name: String,
    pub class_type: String,
}

impl BookingRecord {
    /// JSON schema handed to the model for structured extraction.
    pub fn json_schema() -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "train_name": { "type": "string", "description": "Name of the train" },
                "source": { "type": "string", "description": "Departure city" },
                "destination": { "type": "string", "description": "Arrival city" },
                "passenger_name": { "type": "string", "description": "Passenger name" },
                "class_type": { "type": "string", "description": "Travel class" }
            },
            "required": ["train_name", "source", "destination", "passenger_name", "class_type"],
            "additionalProperties": false
        })
    }
}

impl fmt::Display for BookingRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "train_name='{}' source='{}' destination='{}' passenger_name='{}' class_type='{}'",
            self.train_name, self.source, self.destination, self.passenger_name, self.class_type
        )
    }
}
