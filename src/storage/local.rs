use std::{
    collections::{
        HashMap,
        HashSet,
    },
    path::PathBuf,
};

use chrono::Utc;

use super::ProgressStore;
use crate::{
    core::{
        AbecedaryError,
        AggregateStats,
        ProgressRecord,
    },
    decks::{
        self,
        DeckId,
    },
    persistence,
};

pub fn progress_file(deck: DeckId) -> String {
    format!("guest_progress_{}.json", deck.as_str())
}

pub fn stats_file(deck: DeckId) -> String {
    format!("guest_stats_{}.json", deck.as_str())
}

pub fn achievements_file(deck: DeckId) -> String {
    format!("guest_achievements_{}.json", deck.as_str())
}

/// Guest-mode store: JSON files in the app data directory, one set of
/// deck-qualified files per deck. Corrupt files are discarded key by key and
/// resynthesized; guest play never dies on bad local data.
pub struct LocalStore {
    root: PathBuf,
    deck: DeckId,
}

impl LocalStore {
    pub fn new(deck: DeckId) -> Self {
        Self { root: persistence::default_data_dir(), deck }
    }

    pub fn with_root(root: impl Into<PathBuf>, deck: DeckId) -> Self {
        Self { root: root.into(), deck }
    }

    pub fn deck(&self) -> DeckId {
        self.deck
    }

    /// Stored records as they are on disk, without synthesis. A corrupt blob
    /// is dropped so the next save starts clean.
    pub(crate) fn raw_records(&self) -> Vec<ProgressRecord> {
        let filename = progress_file(self.deck);
        match persistence::load_json(&self.root, &filename) {
            Ok(Some(records)) => records,
            Ok(None) => Vec::new(),
            Err(e) => {
                eprintln!("Discarding corrupt guest progress ({}): {}", filename, e);
                let _ = persistence::delete_data_file(&self.root, &filename);
                Vec::new()
            }
        }
    }

    pub(crate) fn raw_stats(&self) -> Option<AggregateStats> {
        let filename = stats_file(self.deck);
        match persistence::load_json(&self.root, &filename) {
            Ok(stats) => stats,
            Err(e) => {
                eprintln!("Discarding corrupt guest stats ({}): {}", filename, e);
                let _ = persistence::delete_data_file(&self.root, &filename);
                None
            }
        }
    }

    pub(crate) fn raw_achievement_keys(&self) -> Vec<String> {
        let filename = achievements_file(self.deck);
        match persistence::load_json(&self.root, &filename) {
            Ok(Some(keys)) => keys,
            Ok(None) => Vec::new(),
            Err(e) => {
                eprintln!("Discarding corrupt guest achievements ({}): {}", filename, e);
                let _ = persistence::delete_data_file(&self.root, &filename);
                Vec::new()
            }
        }
    }

    pub(crate) fn has_any_data(&self) -> bool {
        persistence::data_file_exists(&self.root, &progress_file(self.deck))
            || persistence::data_file_exists(&self.root, &stats_file(self.deck))
            || persistence::data_file_exists(&self.root, &achievements_file(self.deck))
    }

    /// Remove this deck's guest files, after their content has been merged
    /// into the durable store.
    pub(crate) fn clear_guest_data(&self) -> Result<(), AbecedaryError> {
        persistence::delete_data_file(&self.root, &progress_file(self.deck))?;
        persistence::delete_data_file(&self.root, &stats_file(self.deck))?;
        persistence::delete_data_file(&self.root, &achievements_file(self.deck))?;
        Ok(())
    }
}

impl ProgressStore for LocalStore {
    async fn load_working_set(&self) -> Result<Vec<ProgressRecord>, AbecedaryError> {
        let cards = decks::cards_for_deck(self.deck);
        let now = Utc::now();

        let mut saved: HashMap<String, ProgressRecord> =
            self.raw_records().into_iter().map(|r| (r.card_id.clone(), r)).collect();

        let mut synthesized = false;
        let records: Vec<ProgressRecord> = cards
            .iter()
            .map(|card| {
                saved.remove(&card.id).unwrap_or_else(|| {
                    synthesized = true;
                    ProgressRecord::fresh(&card.id, now)
                })
            })
            .collect();

        // Rewrite the blob when the stored set didn't match the deck: new
        // cards get defaults, records for removed cards are dropped.
        if synthesized || !saved.is_empty() {
            persistence::save_json(&self.root, &progress_file(self.deck), &records)?;
        }

        Ok(records)
    }

    async fn save_records(&self, records: &[ProgressRecord]) -> Result<(), AbecedaryError> {
        let mut stored = self.raw_records();

        for record in records {
            match stored.iter_mut().find(|r| r.card_id == record.card_id) {
                Some(slot) => *slot = record.clone(),
                None => stored.push(record.clone()),
            }
        }

        persistence::save_json(&self.root, &progress_file(self.deck), &stored)
    }

    async fn load_stats(&self) -> Result<AggregateStats, AbecedaryError> {
        Ok(self.raw_stats().unwrap_or_else(|| AggregateStats::empty(Utc::now())))
    }

    async fn save_stats(&self, stats: &AggregateStats) -> Result<(), AbecedaryError> {
        persistence::save_json(&self.root, &stats_file(self.deck), stats)
    }

    async fn unlocked_achievements(&self) -> Result<HashSet<String>, AbecedaryError> {
        Ok(self.raw_achievement_keys().into_iter().collect())
    }

    async fn record_achievement(&self, key: &str) -> Result<(), AbecedaryError> {
        let mut keys = self.raw_achievement_keys();
        if !keys.iter().any(|k| k == key) {
            keys.push(key.to_string());
            persistence::save_json(&self.root, &achievements_file(self.deck), &keys)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{
        Duration,
        Utc,
    };

    use super::*;

    fn store(dir: &tempfile::TempDir, deck: DeckId) -> LocalStore {
        LocalStore::with_root(dir.path(), deck)
    }

    #[tokio::test]
    async fn fresh_guest_gets_a_full_deck_of_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir, DeckId::Uppercase);

        let records = store.load_working_set().await.unwrap();

        assert_eq!(records.len(), 26);
        let now = Utc::now();
        for record in &records {
            assert_eq!(record.mastery_level, 0);
            assert_eq!(record.review_count, 0);
            assert!(record.next_review_at <= now);
        }
        assert!(persistence::data_file_exists(dir.path(), &progress_file(DeckId::Uppercase)));
    }

    #[tokio::test]
    async fn saved_progress_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir, DeckId::Uppercase);

        let mut records = store.load_working_set().await.unwrap();
        records[0].mastery_level = 2;
        records[0].review_count = 5;
        records[0].next_review_at = Utc::now() + Duration::minutes(10);
        let expected = records[0].clone();

        store.save_records(std::slice::from_ref(&records[0])).await.unwrap();
        let reloaded = store.load_working_set().await.unwrap();

        let found = reloaded.iter().find(|r| r.card_id == expected.card_id).unwrap();
        assert_eq!(found.mastery_level, expected.mastery_level);
        assert_eq!(found.review_count, expected.review_count);
        assert_eq!(found.next_review_at, expected.next_review_at);
        assert_eq!(reloaded.len(), 26);
    }

    #[tokio::test]
    async fn upsert_of_one_record_keeps_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir, DeckId::Uppercase);

        let mut records = store.load_working_set().await.unwrap();
        records[3].mastery_level = 1;
        store.save_records(std::slice::from_ref(&records[3])).await.unwrap();

        records[7].mastery_level = 3;
        store.save_records(std::slice::from_ref(&records[7])).await.unwrap();

        let reloaded = store.load_working_set().await.unwrap();
        assert_eq!(reloaded[3].mastery_level, 1);
        assert_eq!(reloaded[7].mastery_level, 3);
    }

    #[tokio::test]
    async fn corrupt_progress_blob_is_replaced_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(progress_file(DeckId::Uppercase)), "][ nonsense").unwrap();

        let store = store(&dir, DeckId::Uppercase);
        let records = store.load_working_set().await.unwrap();

        assert_eq!(records.len(), 26);
        assert!(records.iter().all(|r| r.mastery_level == 0));
    }

    #[tokio::test]
    async fn partial_blob_keeps_existing_progress_and_fills_the_gap() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir, DeckId::Uppercase);

        let mut seed = ProgressRecord::fresh("A", Utc::now());
        seed.mastery_level = 2;
        seed.review_count = 9;
        persistence::save_json(dir.path(), &progress_file(DeckId::Uppercase), &vec![seed])
            .unwrap();

        let records = store.load_working_set().await.unwrap();
        assert_eq!(records.len(), 26);

        let kept = records.iter().find(|r| r.card_id == "A").unwrap();
        assert_eq!(kept.mastery_level, 2);
        assert_eq!(kept.review_count, 9);
        assert!(records.iter().filter(|r| r.card_id != "A").all(|r| r.mastery_level == 0));
    }

    #[tokio::test]
    async fn stats_round_trip_and_survive_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir, DeckId::Lowercase);

        assert_eq!(store.load_stats().await.unwrap().total_stars, 0);

        let stats = AggregateStats { total_stars: 11, last_played_at: Utc::now() };
        store.save_stats(&stats).await.unwrap();
        assert_eq!(store.load_stats().await.unwrap().total_stars, 11);

        std::fs::write(dir.path().join(stats_file(DeckId::Lowercase)), "oops").unwrap();
        assert_eq!(store.load_stats().await.unwrap().total_stars, 0);
    }

    #[tokio::test]
    async fn achievements_are_a_unique_key_set() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir, DeckId::Uppercase);

        store.record_achievement("first_star").await.unwrap();
        store.record_achievement("first_star").await.unwrap();
        store.record_achievement("ten_stars").await.unwrap();

        let unlocked = store.unlocked_achievements().await.unwrap();
        assert_eq!(unlocked.len(), 2);
        assert!(unlocked.contains("first_star"));

        let raw = store.raw_achievement_keys();
        assert_eq!(raw.len(), 2);
    }

    #[tokio::test]
    async fn decks_do_not_share_files() {
        let dir = tempfile::tempdir().unwrap();
        let upper = store(&dir, DeckId::Uppercase);
        let lower = store(&dir, DeckId::Lowercase);

        let mut records = upper.load_working_set().await.unwrap();
        records[0].mastery_level = 3;
        upper.save_records(std::slice::from_ref(&records[0])).await.unwrap();

        let lower_records = lower.load_working_set().await.unwrap();
        assert!(lower_records.iter().all(|r| r.mastery_level == 0));
    }
}
