mod timer;

use std::{
    collections::HashSet,
    path::PathBuf,
    time::Duration,
};

use chrono::Utc;
use rand::{
    rngs::StdRng,
    SeedableRng,
};
use tokio::sync::mpsc::{
    unbounded_channel,
    UnboundedReceiver,
    UnboundedSender,
};

pub use timer::TimerHandle;

use crate::{
    achievements::{
        self,
        Achievement,
    },
    core::{
        AbecedaryError,
        AggregateStats,
        Identity,
        ProgressRecord,
    },
    decks::{
        self,
        Card,
        Deck,
        DeckId,
    },
    migration::MigrationEngine,
    persistence,
    speech::SpeechSink,
    srs,
    storage::ProgressStore,
};

/// Delay before the next card replaces the outcome view.
pub const NEXT_CARD_DELAY: Duration = Duration::from_secs(1);

/// How long an achievement banner stays up before it clears itself.
pub const ACHIEVEMENT_DISMISS_DELAY: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Initializing,
    Ready,
    Flipped,
    /// No cards to present; the deck (or the chosen subset) is empty.
    Empty,
}

/// Scheduled transitions the embedding UI drains and feeds back through
/// `handle_signal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSignal {
    NextCard,
    ClearAchievement,
}

/// Drives one flashcard session: owns the working copy of the deck's
/// progress, asks the scheduler for cards, applies review outcomes, persists
/// through the progress store and keeps the derived star/achievement state.
///
/// Constructed with the resolved identity and the matching store; nothing in
/// here ever branches on which backend it is talking to.
pub struct SessionController<S: ProgressStore> {
    store: S,
    identity: Identity,
    deck: &'static Deck,
    cards: Vec<Card>,
    data_dir: PathBuf,
    speech: Box<dyn SpeechSink>,
    rng: StdRng,

    phase: SessionPhase,
    working_set: Vec<ProgressRecord>,
    current_card_id: Option<String>,
    stats: AggregateStats,
    unlocked: HashSet<String>,
    focus: HashSet<String>,
    pending_achievement: Option<&'static Achievement>,
    celebrations: u32,
    migration_ran: bool,

    signal_tx: UnboundedSender<SessionSignal>,
    signal_rx: UnboundedReceiver<SessionSignal>,
    next_card_timer: Option<TimerHandle>,
    achievement_timer: Option<TimerHandle>,
}

impl<S: ProgressStore> SessionController<S> {
    pub fn new(store: S, identity: Identity, deck_id: DeckId, speech: Box<dyn SpeechSink>) -> Self {
        Self::with_rng(store, identity, deck_id, speech, StdRng::from_os_rng())
    }

    /// Seeded variant so card selection is reproducible under test.
    pub fn with_rng(
        store: S,
        identity: Identity,
        deck_id: DeckId,
        speech: Box<dyn SpeechSink>,
        rng: StdRng,
    ) -> Self {
        let (signal_tx, signal_rx) = unbounded_channel();
        Self {
            store,
            identity,
            deck: decks::deck_by_id(deck_id),
            cards: decks::cards_for_deck(deck_id),
            data_dir: persistence::default_data_dir(),
            speech,
            rng,
            phase: SessionPhase::Initializing,
            working_set: Vec::new(),
            current_card_id: None,
            stats: AggregateStats::empty(Utc::now()),
            unlocked: HashSet::new(),
            focus: HashSet::new(),
            pending_achievement: None,
            celebrations: 0,
            migration_ran: false,
            signal_tx,
            signal_rx,
            next_card_timer: None,
            achievement_timer: None,
        }
    }

    /// Point local lookups (guest files, migration sources) somewhere else
    /// than the default data directory.
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn deck(&self) -> &'static Deck {
        self.deck
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn is_guest(&self) -> bool {
        !self.identity.is_authenticated()
    }

    pub fn total_stars(&self) -> u32 {
        self.stats.total_stars
    }

    pub fn working_set(&self) -> &[ProgressRecord] {
        &self.working_set
    }

    pub fn unlocked_achievements(&self) -> &HashSet<String> {
        &self.unlocked
    }

    pub fn pending_achievement(&self) -> Option<&'static Achievement> {
        self.pending_achievement
    }

    /// Bumped on every successful review; the UI watches it for confetti.
    pub fn celebrations(&self) -> u32 {
        self.celebrations
    }

    pub fn current_card(&self) -> Option<&Card> {
        let id = self.current_card_id.as_deref()?;
        self.cards.iter().find(|card| card.id == id)
    }

    pub fn current_record(&self) -> Option<&ProgressRecord> {
        let id = self.current_card_id.as_deref()?;
        self.working_set.iter().find(|record| record.card_id == id)
    }

    /// Load everything and present the first card. Runs the migration engine
    /// first when the identity is authenticated, at most once per session.
    /// On a storage error the controller stays in `Initializing` untouched,
    /// so a later retry starts from a clean slate.
    pub async fn initialize(&mut self) -> Result<(), AbecedaryError> {
        if self.identity.is_authenticated() && !self.migration_ran {
            self.migration_ran = true;
            MigrationEngine::new(&self.store, self.data_dir.clone()).run().await;
        }

        let working_set = self.store.load_working_set().await?;
        let stats = self.store.load_stats().await?;
        let unlocked = self.store.unlocked_achievements().await?;

        self.working_set = working_set;
        self.stats = stats;
        self.unlocked = unlocked;
        self.select_current();
        Ok(())
    }

    /// Reveal the answer face and speak the card's prompt. Idempotent;
    /// flipping anything but a ready card is a no-op.
    pub fn flip(&mut self) {
        if self.phase != SessionPhase::Ready {
            return;
        }
        self.phase = SessionPhase::Flipped;

        if let Some(prompt) = self.current_card().map(|card| card.spoken_prompt.clone()) {
            self.speech.speak(&prompt);
        }
    }

    /// Apply the reported outcome to the flipped card: level transition,
    /// persistence, stars, achievements, and the delayed move to the next
    /// card. Storage failures are logged and the in-memory state stands; the
    /// worst case is that this one review is not durable.
    pub async fn report_outcome(&mut self, success: bool) {
        if self.phase != SessionPhase::Flipped {
            return;
        }
        let Some(card_id) = self.current_card_id.clone() else {
            return;
        };

        let now = Utc::now();
        let updated = {
            let Some(record) = self.working_set.iter_mut().find(|r| r.card_id == card_id) else {
                return;
            };
            let outcome = srs::compute_review_outcome(record.mastery_level, success, now);
            record.mastery_level = outcome.new_level;
            record.next_review_at = outcome.next_review_at;
            record.review_count += 1;
            record.clone()
        };

        if let Err(e) = self.store.save_records(std::slice::from_ref(&updated)).await {
            eprintln!("Failed to persist review for {}: {}", card_id, e);
        }

        if success {
            self.stats.total_stars += 1;
            self.stats.last_played_at = now;
            self.celebrations += 1;
            if let Err(e) = self.store.save_stats(&self.stats).await {
                eprintln!("Failed to persist stats: {}", e);
            }

            // Thresholds are checked against the already-updated stats and
            // working set, so the review that crossed the line counts.
            let new_achievements =
                achievements::newly_unlocked(self.stats.total_stars, &self.working_set, &self.unlocked);
            if let Some(first) = new_achievements.first().copied() {
                for achievement in &new_achievements {
                    if let Err(e) = self.store.record_achievement(achievement.key).await {
                        eprintln!("Failed to persist achievement {}: {}", achievement.key, e);
                    }
                    self.unlocked.insert(achievement.key.to_string());
                }
                self.show_achievement(first);
            } else if updated.is_mastered() {
                self.speech.speak("You are a master!");
            } else {
                self.speech.speak("Great job!");
            }
        } else {
            self.speech.speak("That's okay, let's learn it.");
        }

        self.schedule_next_card();
    }

    /// Move to the next card now. Usually reached through the NextCard
    /// signal, but callable directly by drivers that manage their own pacing.
    pub fn advance(&mut self) {
        if self.phase == SessionPhase::Initializing {
            return;
        }
        self.select_current();
    }

    pub fn dismiss_achievement(&mut self) {
        self.pending_achievement = None;
        if let Some(timer) = self.achievement_timer.take() {
            timer.cancel();
        }
    }

    /// Narrow selection to the given card ids ("study just these cards").
    /// All records stay persisted; an empty set restores the full deck.
    pub fn set_focus(&mut self, card_ids: HashSet<String>) {
        self.focus = card_ids;
    }

    pub fn focus(&self) -> &HashSet<String> {
        &self.focus
    }

    /// Drain any fired timers without blocking.
    pub fn poll_signals(&mut self) -> Vec<SessionSignal> {
        let mut signals = Vec::new();
        while let Ok(signal) = self.signal_rx.try_recv() {
            signals.push(signal);
        }
        signals
    }

    /// Wait for the next fired timer.
    pub async fn next_signal(&mut self) -> Option<SessionSignal> {
        self.signal_rx.recv().await
    }

    pub fn handle_signal(&mut self, signal: SessionSignal) {
        match signal {
            SessionSignal::NextCard => self.advance(),
            SessionSignal::ClearAchievement => self.dismiss_achievement(),
        }
    }

    fn select_current(&mut self) {
        let now = Utc::now();

        let selected = if self.focus.is_empty() {
            srs::select_next_card(&self.working_set, now, &mut self.rng)
                .map(|record| record.card_id.clone())
        } else {
            let focused: Vec<ProgressRecord> = self
                .working_set
                .iter()
                .filter(|record| self.focus.contains(&record.card_id))
                .cloned()
                .collect();
            srs::select_next_card(&focused, now, &mut self.rng)
                .map(|record| record.card_id.clone())
        };

        match selected {
            Some(card_id) => {
                self.current_card_id = Some(card_id);
                self.phase = SessionPhase::Ready;
            }
            None => {
                self.current_card_id = None;
                self.phase = SessionPhase::Empty;
            }
        }
    }

    fn show_achievement(&mut self, achievement: &'static Achievement) {
        self.pending_achievement = Some(achievement);
        self.speech.speak(&format!("Achievement unlocked! {}", achievement.name));

        if let Some(timer) = self.achievement_timer.take() {
            timer.cancel();
        }
        self.achievement_timer = Some(TimerHandle::schedule(
            ACHIEVEMENT_DISMISS_DELAY,
            SessionSignal::ClearAchievement,
            self.signal_tx.clone(),
        ));
    }

    fn schedule_next_card(&mut self) {
        if let Some(timer) = self.next_card_timer.take() {
            timer.cancel();
        }
        self.next_card_timer = Some(TimerHandle::schedule(
            NEXT_CARD_DELAY,
            SessionSignal::NextCard,
            self.signal_tx.clone(),
        ));
    }
}
