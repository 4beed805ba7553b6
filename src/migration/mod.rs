use std::{
    collections::BTreeMap,
    path::{
        Path,
        PathBuf,
    },
};

use chrono::{
    DateTime,
    TimeZone,
    Utc,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    core::{
        AbecedaryError,
        AggregateStats,
        ProgressRecord,
    },
    decks::DeckId,
    persistence,
    storage::{
        LocalStore,
        ProgressStore,
    },
};

/// Oldest save format: one flat blob for the whole app.
pub const LEGACY_SAVE_FILE: &str = "app_state_v1.json";

/// Marker written once the legacy save has been looked at, migrated or not.
pub const LEGACY_MIGRATED_FLAG: &str = "legacy_migrated.json";

/// Flat guest files from before progress was partitioned per deck.
pub const LEGACY_GUEST_PROGRESS_FILE: &str = "guest_progress.json";
pub const LEGACY_GUEST_STATS_FILE: &str = "guest_stats.json";
pub const LEGACY_GUEST_ACHIEVEMENTS_FILE: &str = "guest_achievements.json";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacySave {
    cards: Vec<LegacyCard>,
    #[serde(default)]
    total_stars: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyCard {
    id: String,
    level: u8,
    /// Epoch milliseconds in the old format.
    next_review: i64,
}

/// Record shape of the flat guest files.
#[derive(Debug, Deserialize)]
struct LegacyGuestRecord {
    letter_id: String,
    level: u8,
    next_review: DateTime<Utc>,
    review_count: u32,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MigrationSummary {
    pub migrated: bool,
    pub stars_imported: u32,
    pub letters_imported: usize,
}

impl MigrationSummary {
    fn absorb(&mut self, other: MigrationSummary) {
        self.migrated |= other.migrated;
        self.stars_imported += other.stars_imported;
        self.letters_imported += other.letters_imported;
    }
}

/// Moves device-local progress into the durable store when a user signs in.
///
/// Both passes write idempotent upserts keyed by (identity, card) or
/// (identity, achievement key), so a re-run with the same source data is a
/// no-op. A failure keeps the local source data so the next session retries.
pub struct MigrationEngine<'a, S: ProgressStore> {
    store: &'a S,
    data_dir: PathBuf,
}

impl<'a, S: ProgressStore> MigrationEngine<'a, S> {
    pub fn new(store: &'a S, data_dir: impl Into<PathBuf>) -> Self {
        Self { store, data_dir: data_dir.into() }
    }

    /// Runs both migration passes. Failures are logged and swallowed; the
    /// session continues with whatever made it across.
    pub async fn run(&self) -> MigrationSummary {
        let mut summary = MigrationSummary::default();

        match self.migrate_legacy_save().await {
            Ok(result) => summary.absorb(result),
            Err(e) => eprintln!("Legacy save migration failed, will retry next session: {}", e),
        }

        match self.merge_guest_progress().await {
            Ok(result) => summary.absorb(result),
            Err(e) => eprintln!("Guest progress merge failed, will retry next session: {}", e),
        }

        if summary.migrated {
            println!(
                "Migrated {} stars and {} letters from local data",
                summary.stars_imported, summary.letters_imported
            );
        }

        summary
    }

    /// One-time import of the oldest save format, guarded by a marker file.
    /// The marker is written even when there is nothing worth importing, so
    /// this pass never runs twice; it stays unwritten on failure.
    async fn migrate_legacy_save(&self) -> Result<MigrationSummary, AbecedaryError> {
        if persistence::data_file_exists(&self.data_dir, LEGACY_MIGRATED_FLAG) {
            return Ok(MigrationSummary::default());
        }

        let legacy: Option<LegacySave> =
            match persistence::load_json(&self.data_dir, LEGACY_SAVE_FILE) {
                Ok(legacy) => legacy,
                Err(e) => {
                    eprintln!("Abandoning unreadable legacy save: {}", e);
                    None
                }
            };

        let Some(legacy) = legacy else {
            self.mark_legacy_done()?;
            return Ok(MigrationSummary::default());
        };

        let has_progress = legacy.cards.iter().any(|c| c.level > 0) || legacy.total_stars > 0;
        if !has_progress {
            self.mark_legacy_done()?;
            return Ok(MigrationSummary::default());
        }

        let mut letters_imported = 0;
        for card in &legacy.cards {
            let next_review_at =
                Utc.timestamp_millis_opt(card.next_review).single().unwrap_or_else(Utc::now);
            let record = ProgressRecord {
                record_id: Uuid::new_v4(),
                card_id: card.id.clone(),
                mastery_level: card.level,
                next_review_at,
                // The old format never counted reviews; the level is the
                // closest available estimate.
                review_count: card.level as u32,
            };
            self.store.save_records(std::slice::from_ref(&record)).await?;
            if card.level > 0 {
                letters_imported += 1;
            }
        }

        if legacy.total_stars > 0 {
            self.store
                .save_stats(&AggregateStats {
                    total_stars: legacy.total_stars,
                    last_played_at: Utc::now(),
                })
                .await?;
        }

        self.mark_legacy_done()?;
        Ok(MigrationSummary {
            migrated: true,
            stars_imported: legacy.total_stars,
            letters_imported,
        })
    }

    fn mark_legacy_done(&self) -> Result<(), AbecedaryError> {
        persistence::save_json(&self.data_dir, LEGACY_MIGRATED_FLAG, &true)
    }

    /// Merge guest play from every deck, plus the flat pre-deck guest files,
    /// into the durable store. Sources are cleared only after every upsert
    /// succeeded; otherwise they stay put for the next session's retry.
    async fn merge_guest_progress(&self) -> Result<MigrationSummary, AbecedaryError> {
        let mut merged: BTreeMap<String, ProgressRecord> = BTreeMap::new();
        let mut stars: u32 = 0;
        let mut keys: Vec<String> = Vec::new();
        let mut found_any_source = false;

        for deck in DeckId::ALL {
            let local = LocalStore::with_root(&self.data_dir, deck);
            found_any_source |= local.has_any_data();

            for record in local.raw_records() {
                if qualifies(record.mastery_level, record.review_count) {
                    merge_record(&mut merged, record);
                }
            }
            stars += local.raw_stats().map(|s| s.total_stars).unwrap_or(0);
            keys.extend(local.raw_achievement_keys());
        }

        found_any_source |= self.gather_flat_guest_data(&mut merged, &mut stars, &mut keys);

        if !found_any_source {
            return Ok(MigrationSummary::default());
        }

        for record in merged.values() {
            self.store.save_records(std::slice::from_ref(record)).await?;
        }
        if stars > 0 {
            self.store
                .save_stats(&AggregateStats { total_stars: stars, last_played_at: Utc::now() })
                .await?;
        }
        keys.sort();
        keys.dedup();
        for key in &keys {
            self.store.record_achievement(key).await?;
        }

        // Everything is durable now; drop the guest copies so they cannot be
        // merged twice.
        for deck in DeckId::ALL {
            LocalStore::with_root(&self.data_dir, deck).clear_guest_data()?;
        }
        self.clear_flat_guest_data()?;

        let migrated = !merged.is_empty() || stars > 0 || !keys.is_empty();
        Ok(MigrationSummary {
            migrated,
            stars_imported: stars,
            letters_imported: merged.len(),
        })
    }

    /// Returns whether any flat guest file existed.
    fn gather_flat_guest_data(
        &self,
        merged: &mut BTreeMap<String, ProgressRecord>,
        stars: &mut u32,
        keys: &mut Vec<String>,
    ) -> bool {
        let mut found = false;

        if persistence::data_file_exists(&self.data_dir, LEGACY_GUEST_PROGRESS_FILE) {
            found = true;
            match persistence::load_json::<Vec<LegacyGuestRecord>>(
                &self.data_dir,
                LEGACY_GUEST_PROGRESS_FILE,
            ) {
                Ok(Some(records)) => {
                    for legacy in records {
                        if qualifies(legacy.level, legacy.review_count) {
                            merge_record(
                                merged,
                                ProgressRecord {
                                    record_id: Uuid::new_v4(),
                                    card_id: legacy.letter_id,
                                    mastery_level: legacy.level,
                                    next_review_at: legacy.next_review,
                                    review_count: legacy.review_count,
                                },
                            );
                        }
                    }
                }
                Ok(None) => {}
                Err(e) => eprintln!("Skipping corrupt flat guest progress: {}", e),
            }
        }

        if persistence::data_file_exists(&self.data_dir, LEGACY_GUEST_STATS_FILE) {
            found = true;
            // The flat stats file holds a bare star count.
            match persistence::load_json::<u32>(&self.data_dir, LEGACY_GUEST_STATS_FILE) {
                Ok(Some(count)) => *stars += count,
                Ok(None) => {}
                Err(e) => eprintln!("Skipping corrupt flat guest stats: {}", e),
            }
        }

        if persistence::data_file_exists(&self.data_dir, LEGACY_GUEST_ACHIEVEMENTS_FILE) {
            found = true;
            match persistence::load_json::<Vec<String>>(
                &self.data_dir,
                LEGACY_GUEST_ACHIEVEMENTS_FILE,
            ) {
                Ok(Some(legacy_keys)) => keys.extend(legacy_keys),
                Ok(None) => {}
                Err(e) => eprintln!("Skipping corrupt flat guest achievements: {}", e),
            }
        }

        found
    }

    fn clear_flat_guest_data(&self) -> Result<(), AbecedaryError> {
        persistence::delete_data_file(&self.data_dir, LEGACY_GUEST_PROGRESS_FILE)?;
        persistence::delete_data_file(&self.data_dir, LEGACY_GUEST_STATS_FILE)?;
        persistence::delete_data_file(&self.data_dir, LEGACY_GUEST_ACHIEVEMENTS_FILE)?;
        Ok(())
    }
}

fn qualifies(level: u8, review_count: u32) -> bool {
    level > 0 || review_count > 0
}

/// The same card can show up in several decks' guest files (the mixed deck
/// shares ids with the single-case decks); the strongest copy wins.
fn merge_record(merged: &mut BTreeMap<String, ProgressRecord>, record: ProgressRecord) {
    match merged.get_mut(&record.card_id) {
        Some(existing) => {
            if (record.mastery_level, record.review_count)
                > (existing.mastery_level, existing.review_count)
            {
                *existing = record;
            }
        }
        None => {
            merged.insert(record.card_id.clone(), record);
        }
    }
}

/// Convenience helper for the legacy marker, used on sign-out in the app
/// shell so a fresh account can re-import.
pub fn clear_legacy_flag(data_dir: &Path) -> Result<(), AbecedaryError> {
    persistence::delete_data_file(data_dir, LEGACY_MIGRATED_FLAG)
}
