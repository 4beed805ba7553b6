use std::collections::HashSet;

use chrono::Utc;
use uuid::Uuid;

use super::ProgressStore;
use crate::{
    backend::{
        BackendClient,
        CardProgressRow,
        UserStatsRow,
    },
    core::{
        AbecedaryError,
        AggregateStats,
        ProgressRecord,
    },
    decks::{
        self,
        DeckId,
    },
};

/// Authenticated-mode store backed by the durable record store. Progress is
/// keyed by (user_id, card_id); stats and achievements are user-scoped and
/// shared across decks and devices.
pub struct RemoteStore {
    client: BackendClient,
    user_id: String,
    deck: DeckId,
}

impl RemoteStore {
    pub fn new(client: BackendClient, user_id: impl Into<String>, deck: DeckId) -> Self {
        Self { client, user_id: user_id.into(), deck }
    }

    fn record_from_row(row: CardProgressRow) -> ProgressRecord {
        ProgressRecord {
            record_id: row.id.unwrap_or_else(Uuid::new_v4),
            card_id: row.letter_id,
            mastery_level: row.level,
            next_review_at: row.next_review,
            review_count: row.review_count,
        }
    }

    fn row_from_record(&self, record: &ProgressRecord) -> CardProgressRow {
        CardProgressRow {
            id: Some(record.record_id),
            user_id: self.user_id.clone(),
            letter_id: record.card_id.clone(),
            level: record.mastery_level,
            next_review: record.next_review_at,
            review_count: record.review_count,
        }
    }
}

impl ProgressStore for RemoteStore {
    async fn load_working_set(&self) -> Result<Vec<ProgressRecord>, AbecedaryError> {
        let cards = decks::cards_for_deck(self.deck);
        let card_ids: Vec<String> = cards.iter().map(|c| c.id.clone()).collect();

        let existing = self.client.select_progress(&self.user_id, &card_ids).await?;
        let have: HashSet<&str> = existing.iter().map(|row| row.letter_id.as_str()).collect();

        let now = Utc::now();
        let missing: Vec<CardProgressRow> = cards
            .iter()
            .filter(|card| !have.contains(card.id.as_str()))
            .map(|card| self.row_from_record(&ProgressRecord::fresh(&card.id, now)))
            .collect();

        // Insert defaults for exactly the missing cards, then re-read so the
        // returned set matches the deck one to one.
        let rows = if missing.is_empty() {
            existing
        } else {
            self.client.insert_progress(&missing).await?;
            self.client.select_progress(&self.user_id, &card_ids).await?
        };

        Ok(rows.into_iter().map(Self::record_from_row).collect())
    }

    async fn save_records(&self, records: &[ProgressRecord]) -> Result<(), AbecedaryError> {
        for record in records {
            self.client.upsert_progress(&self.row_from_record(record)).await?;
        }
        Ok(())
    }

    async fn load_stats(&self) -> Result<AggregateStats, AbecedaryError> {
        Ok(self
            .client
            .select_stats(&self.user_id)
            .await?
            .map(|row| AggregateStats {
                total_stars: row.total_stars,
                last_played_at: row.last_played_at,
            })
            .unwrap_or_else(|| AggregateStats::empty(Utc::now())))
    }

    async fn save_stats(&self, stats: &AggregateStats) -> Result<(), AbecedaryError> {
        self.client
            .upsert_stats(&UserStatsRow {
                user_id: self.user_id.clone(),
                total_stars: stats.total_stars,
                last_played_at: stats.last_played_at,
            })
            .await
    }

    async fn unlocked_achievements(&self) -> Result<HashSet<String>, AbecedaryError> {
        Ok(self.client.select_achievements(&self.user_id).await?.into_iter().collect())
    }

    async fn record_achievement(&self, key: &str) -> Result<(), AbecedaryError> {
        self.client.upsert_achievement(&self.user_id, key).await
    }
}
