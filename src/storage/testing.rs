use std::{
    collections::{
        HashMap,
        HashSet,
    },
    sync::{
        atomic::{
            AtomicU32,
            Ordering,
        },
        Mutex,
    },
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
};

const NO_FAILURE: u32 = u32::MAX;

#[derive(Default)]
struct MemoryInner {
    records: HashMap<String, ProgressRecord>,
    stats: Option<AggregateStats>,
    achievements: HashSet<String>,
}

/// In-memory stand-in for the durable backend: records keyed flat by card id
/// like the remote table, with a countdown switch that fails writes once it
/// reaches zero, for partial-failure tests.
pub struct MemoryStore {
    deck: DeckId,
    inner: Mutex<MemoryInner>,
    writes_before_failure: AtomicU32,
}

impl MemoryStore {
    pub fn new(deck: DeckId) -> Self {
        Self {
            deck,
            inner: Mutex::new(MemoryInner::default()),
            writes_before_failure: AtomicU32::new(NO_FAILURE),
        }
    }

    /// Let `writes` more mutating calls through, then fail every one after.
    pub fn fail_after_writes(&self, writes: u32) {
        self.writes_before_failure.store(writes, Ordering::SeqCst);
    }

    pub fn heal(&self) {
        self.writes_before_failure.store(NO_FAILURE, Ordering::SeqCst);
    }

    pub fn record(&self, card_id: &str) -> Option<ProgressRecord> {
        self.inner.lock().unwrap().records.get(card_id).cloned()
    }

    pub fn record_count(&self) -> usize {
        self.inner.lock().unwrap().records.len()
    }

    pub fn stats(&self) -> Option<AggregateStats> {
        self.inner.lock().unwrap().stats.clone()
    }

    pub fn achievement_keys(&self) -> HashSet<String> {
        self.inner.lock().unwrap().achievements.clone()
    }

    fn check_write(&self) -> Result<(), AbecedaryError> {
        let remaining = self.writes_before_failure.load(Ordering::SeqCst);
        if remaining == NO_FAILURE {
            return Ok(());
        }
        if remaining == 0 {
            return Err(AbecedaryError::StorageUnavailable("injected failure".to_string()));
        }
        self.writes_before_failure.store(remaining - 1, Ordering::SeqCst);
        Ok(())
    }
}

impl ProgressStore for MemoryStore {
    async fn load_working_set(&self) -> Result<Vec<ProgressRecord>, AbecedaryError> {
        let now = Utc::now();
        let mut inner = self.inner.lock().unwrap();

        Ok(decks::cards_for_deck(self.deck)
            .iter()
            .map(|card| {
                inner
                    .records
                    .entry(card.id.clone())
                    .or_insert_with(|| ProgressRecord::fresh(&card.id, now))
                    .clone()
            })
            .collect())
    }

    async fn save_records(&self, records: &[ProgressRecord]) -> Result<(), AbecedaryError> {
        self.check_write()?;
        let mut inner = self.inner.lock().unwrap();
        for record in records {
            inner.records.insert(record.card_id.clone(), record.clone());
        }
        Ok(())
    }

    async fn load_stats(&self) -> Result<AggregateStats, AbecedaryError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .stats
            .clone()
            .unwrap_or_else(|| AggregateStats::empty(Utc::now())))
    }

    async fn save_stats(&self, stats: &AggregateStats) -> Result<(), AbecedaryError> {
        self.check_write()?;
        self.inner.lock().unwrap().stats = Some(stats.clone());
        Ok(())
    }

    async fn unlocked_achievements(&self) -> Result<HashSet<String>, AbecedaryError> {
        Ok(self.inner.lock().unwrap().achievements.clone())
    }

    async fn record_achievement(&self, key: &str) -> Result<(), AbecedaryError> {
        self.check_write()?;
        self.inner.lock().unwrap().achievements.insert(key.to_string());
        Ok(())
    }
}
