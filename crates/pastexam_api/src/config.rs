// path: crates/pastexam_api/src/config.rs
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Без суффикса `/api`, его добавляет клиент
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_api_url() -> String { "http://localhost:8000".into() }
fn default_timeout_ms() -> u64 { 10_000 }

impl Default for ApiConfig {
    fn default() -> Self {
        Self { api_url: default_api_url(), timeout_ms: default_timeout_ms() }
    }
}

impl ApiConfig {
    pub fn from_env() -> Self {
        let api_url = std::env::var("PASTEXAM_API_URL").unwrap_or_else(|_| default_api_url());
        let timeout_ms = std::env::var("PASTEXAM_TIMEOUT_MS").ok().and_then(|s| s.parse().ok()).unwrap_or(default_timeout_ms());
        Self { api_url, timeout_ms }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// `{api_url}/api`, без двойного слэша
    pub fn base_url(&self) -> String {
        format!("{}/api", self.api_url.trim_end_matches('/'))
    }
}
