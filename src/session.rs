//! Session identifiers

use uuid::Uuid;

/// Fresh random session id for a new conversation
#[must_use]
pub fn generate_session_id() -> String {
    Uuid::new_v4().to_string()
}
