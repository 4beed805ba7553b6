use serde::{
    Deserialize,
    Serialize,
};

use crate::{
    backend::DEFAULT_BACKEND_URL,
    core::Identity,
    persistence,
};

pub const CONFIG_FILE: &str = "config.json";

/// App configuration kept next to the progress files. The auth flow itself
/// lives outside this crate; by the time we run, it has either left a user
/// id here or it hasn't.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub backend_url: String,
    pub user_id: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { backend_url: DEFAULT_BACKEND_URL.to_string(), user_id: None }
    }
}

impl AppConfig {
    pub fn load() -> Self {
        let dir = persistence::default_data_dir();
        match persistence::load_json(&dir, CONFIG_FILE) {
            Ok(Some(config)) => config,
            Ok(None) => AppConfig::default(),
            Err(e) => {
                eprintln!("Failed to load {}: {}. Using defaults.", CONFIG_FILE, e);
                AppConfig::default()
            }
        }
    }

    pub fn save(&self) -> Result<(), crate::core::AbecedaryError> {
        persistence::save_json(&persistence::default_data_dir(), CONFIG_FILE, self)
    }

    pub fn resolved_identity(&self) -> Identity {
        match &self.user_id {
            Some(user_id) => Identity::Authenticated { user_id: user_id.clone() },
            None => Identity::Guest,
        }
    }
}
