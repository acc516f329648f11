use serde::{Deserialize, Serialize};

const AFFIRMATIVE_REPLIES: &[&str] = &["yes", "y", "book", "book it", "confirm", "ok book"];
const NEGATIVE_REPLIES: &[&str] = &["no", "nope", "nah"];

/// How the router should treat an inbound user line before any model is involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationIntent {
    Affirmative,
    Negative,
    Open,
}

pub fn normalize_text(input: &str) -> String {
    input.trim().to_lowercase()
}

/// Exact-match classification: "yes please" is `Open`, not `Affirmative`.
pub fn classify_confirmation(text: &str) -> ConfirmationIntent {
    let normalized = normalize_text(text);

    if matches_any(&normalized, AFFIRMATIVE_REPLIES) {
        ConfirmationIntent::Affirmative
    } else if matches_any(&normalized, NEGATIVE_REPLIES) {
        ConfirmationIntent::Negative
    } else {
        ConfirmationIntent::Open
    }
}

fn matches_any(input: &str, candidates: &[&str]) -> bool {
    candidates.iter().any(|candidate| input == *candidate)
}
