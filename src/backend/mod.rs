pub mod api;

pub use api::{
    AchievementRow,
    BackendClient,
    CardProgressRow,
    UserStatsRow,
    DEFAULT_BACKEND_URL,
};
