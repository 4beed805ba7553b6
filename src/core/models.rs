use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};
use uuid::Uuid;

/// Highest mastery level a card can reach.
pub const MASTERED_LEVEL: u8 = 3;

/// Review state for one card under one identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub record_id: Uuid,
    pub card_id: String,
    pub mastery_level: u8,
    pub next_review_at: DateTime<Utc>,
    pub review_count: u32,
}

impl ProgressRecord {
    /// A never-reviewed record: level 0, due immediately.
    pub fn fresh(card_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            record_id: Uuid::new_v4(),
            card_id: card_id.to_string(),
            mastery_level: 0,
            next_review_at: now,
            review_count: 0,
        }
    }

    pub fn is_mastered(&self) -> bool {
        self.mastery_level >= MASTERED_LEVEL
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review_at <= now
    }
}

/// Totals kept per identity, across all decks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub total_stars: u32,
    pub last_played_at: DateTime<Utc>,
}

impl AggregateStats {
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self { total_stars: 0, last_played_at: now }
    }
}

/// Who progress belongs to. Guests live in device-local files; authenticated
/// users in the durable backend, shared across devices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Guest,
    Authenticated { user_id: String },
}

impl Identity {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Identity::Authenticated { .. })
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            Identity::Guest => None,
            Identity::Authenticated { user_id } => Some(user_id),
        }
    }
}
