pub mod intent;
pub mod models;
pub mod prompts;

pub use intent::{classify_confirmation, normalize_text, ConfirmationIntent};
pub use models::*;
pub use prompts::{
    canned_reply, contains_ready_marker, BOOKING_PORTAL_URL, DECLINE_REPLY, READY_TO_BOOK,
    SYSTEM_INSTRUCTION,
};
