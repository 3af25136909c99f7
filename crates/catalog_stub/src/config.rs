// path: crates/catalog_stub/src/config.rs
use serde::Deserialize;

#[derive(Clone, Deserialize)]
pub struct StubConfig {
    pub addr: String,
    /// JSONL, по курсу на строку. Без пути берётся встроенный демо-каталог
    #[serde(default)]
    pub catalog_path: Option<String>,
    #[serde(default = "default_max_limit")]
    pub max_limit: u64,
}

fn default_max_limit() -> u64 { 100 }

impl StubConfig {
    pub fn from_env() -> Self {
        let addr = std::env::var("PASTEXAM_STUB_ADDR").unwrap_or_else(|_| "127.0.0.1:8000".into());
        let catalog_path = std::env::var("PASTEXAM_STUB_CATALOG").ok();
        let max_limit = std::env::var("PASTEXAM_STUB_MAX_LIMIT").ok().and_then(|s| s.parse().ok()).unwrap_or(default_max_limit());

        Self { addr, catalog_path, max_limit }
    }
}
