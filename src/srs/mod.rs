use chrono::{
    DateTime,
    Duration,
    Utc,
};
use rand::{
    seq::IndexedRandom,
    Rng,
};

use crate::core::models::{
    ProgressRecord,
    MASTERED_LEVEL,
};

/// Review interval in seconds, indexed by the level a card just reached.
/// Short on purpose: a toddler's attention span is minutes, not days.
const REVIEW_INTERVALS_SECS: [i64; 4] = [0, 120, 600, 3600];

/// Levels past the table get a day.
const FALLBACK_INTERVAL_SECS: i64 = 86_400;

/// A missed card comes back quickly no matter its level.
const FAIL_INTERVAL_SECS: i64 = 30;

/// Due cards are drawn from the weakest few instead of strictly the weakest,
/// so the presentation order stays unpredictable.
const CANDIDATE_POOL: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewOutcome {
    pub new_level: u8,
    pub next_review_at: DateTime<Utc>,
}

/// Level transition and next review time for a single answer. Pure; levels
/// outside the table are clamped, never rejected.
pub fn compute_review_outcome(
    current_level: u8,
    success: bool,
    now: DateTime<Utc>,
) -> ReviewOutcome {
    if success {
        let new_level = current_level.saturating_add(1).min(MASTERED_LEVEL);
        let interval = REVIEW_INTERVALS_SECS
            .get(new_level as usize)
            .copied()
            .unwrap_or(FALLBACK_INTERVAL_SECS);
        ReviewOutcome { new_level, next_review_at: now + Duration::seconds(interval) }
    } else {
        ReviewOutcome {
            new_level: current_level.saturating_sub(1),
            next_review_at: now + Duration::seconds(FAIL_INTERVAL_SECS),
        }
    }
}

/// Pick the card to present next.
///
/// Due cards win, weakest first, with a random draw from the top few so a
/// child can't memorize the order instead of the letters. With nothing due,
/// fall back to a random unmastered card, then to any card at all. Returns
/// None only for an empty record set.
pub fn select_next_card<'a, R: Rng + ?Sized>(
    records: &'a [ProgressRecord],
    now: DateTime<Utc>,
    rng: &mut R,
) -> Option<&'a ProgressRecord> {
    if records.is_empty() {
        return None;
    }

    let mut due: Vec<&ProgressRecord> = records.iter().filter(|r| r.is_due(now)).collect();

    if due.is_empty() {
        let unmastered: Vec<&ProgressRecord> =
            records.iter().filter(|r| !r.is_mastered()).collect();
        if unmastered.is_empty() {
            return records.choose(rng);
        }
        return unmastered.choose(rng).copied();
    }

    // Stable sort keeps equal-level cards in working-set order.
    due.sort_by_key(|r| r.mastery_level);
    let candidates = &due[..due.len().min(CANDIDATE_POOL)];
    candidates.choose(rng).copied()
}

#[cfg(test)]
mod tests {
    use chrono::{
        Duration,
        Utc,
    };
    use rand::{
        rngs::StdRng,
        SeedableRng,
    };

    use super::*;

    fn record(card_id: &str, level: u8, due_in_secs: i64) -> ProgressRecord {
        let mut record = ProgressRecord::fresh(card_id, Utc::now());
        record.mastery_level = level;
        record.next_review_at = Utc::now() + Duration::seconds(due_in_secs);
        record
    }

    #[test]
    fn success_climbs_one_level_and_spaces_reviews_out() {
        let now = Utc::now();
        let expected = [(0u8, 1u8, 120), (1, 2, 600), (2, 3, 3600), (3, 3, 3600)];

        for (level, new_level, interval) in expected {
            let outcome = compute_review_outcome(level, true, now);
            assert_eq!(outcome.new_level, new_level);
            assert_eq!(outcome.next_review_at, now + Duration::seconds(interval));
        }
    }

    #[test]
    fn intervals_grow_with_level() {
        let now = Utc::now();
        let mut previous = now;
        for level in 0..MASTERED_LEVEL {
            let outcome = compute_review_outcome(level, true, now);
            assert!(outcome.next_review_at > previous);
            previous = outcome.next_review_at;
        }
    }

    #[test]
    fn failure_drops_one_level_and_retries_in_thirty_seconds() {
        let now = Utc::now();
        for level in 0..=MASTERED_LEVEL {
            let outcome = compute_review_outcome(level, false, now);
            assert_eq!(outcome.new_level, level.saturating_sub(1));
            assert_eq!(outcome.next_review_at, now + Duration::seconds(30));
        }
    }

    #[test]
    fn out_of_range_level_is_clamped_on_success() {
        let now = Utc::now();
        let outcome = compute_review_outcome(200, true, now);
        assert_eq!(outcome.new_level, MASTERED_LEVEL);
    }

    #[test]
    fn empty_set_selects_nothing() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(select_next_card(&[], Utc::now(), &mut rng).is_none());
    }

    #[test]
    fn due_selection_skips_strong_cards_when_weak_ones_wait() {
        let now = Utc::now();
        let records = vec![
            record("A", 0, -10),
            record("B", 0, -10),
            record("C", 1, -10),
            record("D", 3, -10),
        ];

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let picked = select_next_card(&records, now, &mut rng).unwrap();
            assert_ne!(picked.card_id, "D");
        }
    }

    #[test]
    fn nothing_due_falls_back_to_unmastered() {
        let now = Utc::now();
        let records = vec![record("A", 3, 600), record("B", 3, 600), record("C", 1, 600)];

        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let picked = select_next_card(&records, now, &mut rng).unwrap();
            assert_eq!(picked.card_id, "C");
        }
    }

    #[test]
    fn full_mastery_still_presents_a_card() {
        let now = Utc::now();
        let records = vec![record("A", 3, 600), record("B", 3, 600)];

        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..50 {
            assert!(select_next_card(&records, now, &mut rng).is_some());
        }
    }

    #[test]
    fn seeded_selection_is_reproducible() {
        let now = Utc::now();
        let records = vec![record("A", 0, -10), record("B", 0, -10), record("C", 0, -10)];

        let first: Vec<String> = {
            let mut rng = StdRng::seed_from_u64(42);
            (0..10)
                .map(|_| select_next_card(&records, now, &mut rng).unwrap().card_id.clone())
                .collect()
        };
        let second: Vec<String> = {
            let mut rng = StdRng::seed_from_u64(42);
            (0..10)
                .map(|_| select_next_card(&records, now, &mut rng).unwrap().card_id.clone())
                .collect()
        };

        assert_eq!(first, second);
    }
}
