use chrono::{
    DateTime,
    Utc,
};
use reqwest::Client;
use serde::{
    Deserialize,
    Serialize,
};
use serde_json::json;
use tokio::time::{
    sleep,
    Duration,
};
use uuid::Uuid;

use crate::core::AbecedaryError;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8790/";

/// Row in the card_progress table, unique on (user_id, letter_id).
/// Timestamps cross the wire as ISO-8601 strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardProgressRow {
    pub id: Option<Uuid>,
    pub user_id: String,
    pub letter_id: String,
    pub level: u8,
    pub next_review: DateTime<Utc>,
    pub review_count: u32,
}

/// Row in the user_stats table, unique on user_id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStatsRow {
    pub user_id: String,
    pub total_stars: u32,
    pub last_played_at: DateTime<Utc>,
}

/// Row in the user_achievements table, unique on (user_id, achievement_key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementRow {
    pub user_id: String,
    pub achievement_key: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub result: Option<T>,
    pub error: Option<String>,
}

/// Client for the durable record store: action-based POSTs to a single
/// endpoint, every response wrapped in the result/error envelope.
pub struct BackendClient {
    base_url: String,
    http: Client,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), http: Client::new() }
    }

    async fn request<T: for<'de> Deserialize<'de>>(
        &self,
        action: &str,
        params: serde_json::Value,
    ) -> Result<Option<T>, AbecedaryError> {
        let mut body = serde_json::Map::new();
        body.insert("action".to_string(), serde_json::Value::String(action.to_string()));
        body.insert("version".to_string(), serde_json::Value::Number((1).into()));
        body.insert("params".to_string(), params);

        let response: ApiResponse<T> =
            self.http.post(&self.base_url).json(&body).send().await?.json().await?;

        if let Some(error) = response.error {
            return Err(AbecedaryError::StorageUnavailable(error));
        }
        Ok(response.result)
    }

    async fn command(&self, action: &str, params: serde_json::Value) -> Result<(), AbecedaryError> {
        self.request::<serde_json::Value>(action, params).await?;
        Ok(())
    }

    // Used to check whether the record store is online.
    pub async fn get_version(&self) -> Result<u32, AbecedaryError> {
        let version = self.request("version", json!({})).await?;
        Ok(version.unwrap_or_default())
    }

    /// Bounded startup retry: the store may still be coming up when the app
    /// launches. Returns false once the attempts run out.
    pub async fn wait_available(&self, wait_secs: u64, max_attempts: u32) -> bool {
        for attempt in 1..=max_attempts {
            match self.get_version().await {
                Ok(version) => {
                    println!("Record store is online. Version: {}", version);
                    return true;
                }
                Err(err) => {
                    eprintln!(
                        "Record store attempt {} of {} failed. Retrying in {} seconds... Error: {}",
                        attempt, max_attempts, wait_secs, err
                    );
                    if attempt < max_attempts {
                        sleep(Duration::from_secs(wait_secs)).await;
                    }
                }
            }
        }
        false
    }

    pub async fn select_progress(
        &self,
        user_id: &str,
        letter_ids: &[String],
    ) -> Result<Vec<CardProgressRow>, AbecedaryError> {
        let rows = self
            .request("selectProgress", json!({ "user_id": user_id, "letter_ids": letter_ids }))
            .await?;
        Ok(rows.unwrap_or_default())
    }

    pub async fn insert_progress(&self, rows: &[CardProgressRow]) -> Result<(), AbecedaryError> {
        self.command("insertProgress", json!({ "rows": rows })).await
    }

    pub async fn upsert_progress(&self, row: &CardProgressRow) -> Result<(), AbecedaryError> {
        self.command(
            "upsertProgress",
            json!({ "row": row, "on_conflict": "user_id,letter_id" }),
        )
        .await
    }

    pub async fn select_stats(
        &self,
        user_id: &str,
    ) -> Result<Option<UserStatsRow>, AbecedaryError> {
        self.request("selectStats", json!({ "user_id": user_id })).await
    }

    pub async fn upsert_stats(&self, row: &UserStatsRow) -> Result<(), AbecedaryError> {
        self.command("upsertStats", json!({ "row": row, "on_conflict": "user_id" })).await
    }

    pub async fn select_achievements(
        &self,
        user_id: &str,
    ) -> Result<Vec<String>, AbecedaryError> {
        let rows: Option<Vec<AchievementRow>> =
            self.request("selectAchievements", json!({ "user_id": user_id })).await?;
        Ok(rows.unwrap_or_default().into_iter().map(|row| row.achievement_key).collect())
    }

    pub async fn upsert_achievement(
        &self,
        user_id: &str,
        achievement_key: &str,
    ) -> Result<(), AbecedaryError> {
        self.command(
            "upsertAchievement",
            json!({
                "row": AchievementRow {
                    user_id: user_id.to_string(),
                    achievement_key: achievement_key.to_string(),
                },
                "on_conflict": "user_id,achievement_key",
            }),
        )
        .await
    }
}
