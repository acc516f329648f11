use crate::intent::ConfirmationIntent;

/// Marker the model emits once it has everything needed for a booking.
pub const READY_TO_BOOK: &str = "READY_TO_BOOK";

pub const BOOKING_PORTAL_URL: &str = "https://www.irctc.co.in/nget/train-search";

pub const DECLINE_REPLY: &str = "No problem! Tell me what else you want to search or ask.";

pub const SYSTEM_INSTRUCTION: &str = "You are TransitSense.\n\
1. Use 'search_railway_info' tool when user asks about schedules or policies.\n\
2. If user says 'book this' or 'confirm ticket', ask for passenger name if missing.\n\
3. When ready, output EXACT TEXT: READY_TO_BOOK.\n";

pub fn booking_confirmation_reply() -> String {
    format!(
        "Great! You can book the ticket using the official IRCTC portal:\n\
         👉 **{BOOKING_PORTAL_URL}**\n\n\
         If you'd like, I can help you find more trains or compare prices!"
    )
}

/// Fixed reply for confirmation intents, `None` when the model has to answer.
pub fn canned_reply(intent: ConfirmationIntent) -> Option<String> {
    match intent {
        ConfirmationIntent::Affirmative => Some(booking_confirmation_reply()),
        ConfirmationIntent::Negative => Some(DECLINE_REPLY.to_string()),
        ConfirmationIntent::Open => None,
    }
}

pub fn contains_ready_marker(text: &str) -> bool {
    text.contains(READY_TO_BOOK)
}
