use std::collections::HashSet;

use crate::core::{
    AbecedaryError,
    AggregateStats,
    ProgressRecord,
};

pub mod local;
pub mod remote;
#[cfg(test)]
pub mod testing;

pub use local::LocalStore;
pub use remote::RemoteStore;

/// The operations every progress backend exposes. A store instance is bound
/// to one identity and one deck when it is constructed; callers never learn
/// which backend they hold.
///
/// `load_working_set` guarantees exactly one record per deck card: existing
/// progress is kept by card-id match and anything missing is synthesized at
/// level 0, due immediately.
#[allow(async_fn_in_trait)]
pub trait ProgressStore {
    async fn load_working_set(&self) -> Result<Vec<ProgressRecord>, AbecedaryError>;

    /// Upsert the given records by card id; untouched records are preserved.
    async fn save_records(&self, records: &[ProgressRecord]) -> Result<(), AbecedaryError>;

    async fn load_stats(&self) -> Result<AggregateStats, AbecedaryError>;

    async fn save_stats(&self, stats: &AggregateStats) -> Result<(), AbecedaryError>;

    async fn unlocked_achievements(&self) -> Result<HashSet<String>, AbecedaryError>;

    /// Insert-if-absent; recording a held key again is a no-op.
    async fn record_achievement(&self, key: &str) -> Result<(), AbecedaryError>;
}
