//! Message types: the append-only conversation log attached to a deal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who authored a message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MessageRole {
    /// The vendor (counterparty) side.
    Vendor,
    /// The PM (buyer) side, whether drafted by the engine or a human.
    Buyer,
    /// System-generated, e.g. a status-change note.
    System,
}

/// One entry in a deal's append-only message log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Stable id.
    pub id: Uuid,
    /// The deal this message belongs to.
    pub deal_id: Uuid,
    /// Who authored it.
    pub role: MessageRole,
    /// Free-text body as received or sent. The canonical record; parsed
    /// offers are derived from this, never the reverse.
    pub content: String,
    /// The negotiation round this message belongs to.
    pub round: u32,
    /// When the message was recorded.
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Construct a new message stamped `created_at` by the caller
    /// (components never read the system clock directly so their output
    /// stays deterministic under test).
    pub fn new(
        deal_id: Uuid,
        role: MessageRole,
        content: impl Into<String>,
        round: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            deal_id,
            role,
            content: content.into(),
            round,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_new_assigns_fresh_id() {
        let deal_id = Uuid::new_v4();
        let a = Message::new(deal_id, MessageRole::Vendor, "hello", 1, Utc::now());
        let b = Message::new(deal_id, MessageRole::Vendor, "hello", 1, Utc::now());
        assert_ne!(a.id, b.id);
    }
}
