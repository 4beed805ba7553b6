pub mod errors;
pub mod models;

pub use errors::AbecedaryError;
pub use models::{
    AggregateStats,
    Identity,
    ProgressRecord,
    MASTERED_LEVEL,
};
