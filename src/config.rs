// path: src/config.rs
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct SelectorConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Насколько близко к низу списка (px) надо доскроллить, чтобы догрузить страницу
    #[serde(default = "default_scroll_threshold_px")]
    pub scroll_threshold_px: f64,
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
}

fn default_page_size() -> usize { 10 }
fn default_debounce_ms() -> u64 { 300 }
fn default_scroll_threshold_px() -> f64 { 100.0 }
fn default_placeholder() -> String { "Search and select a course".into() }

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            debounce_ms: default_debounce_ms(),
            scroll_threshold_px: default_scroll_threshold_px(),
            placeholder: default_placeholder(),
        }
    }
}

impl SelectorConfig {
    pub fn from_env() -> Self {
        let page_size = std::env::var("PASTEXAM_PAGE_SIZE").ok().and_then(|s| s.parse().ok()).filter(|&n: &usize| n > 0).unwrap_or(default_page_size());
        let debounce_ms = std::env::var("PASTEXAM_DEBOUNCE_MS").ok().and_then(|s| s.parse().ok()).unwrap_or(default_debounce_ms());
        let scroll_threshold_px = std::env::var("PASTEXAM_SCROLL_THRESHOLD_PX").ok().and_then(|s| s.parse().ok()).unwrap_or(default_scroll_threshold_px());
        Self { page_size, debounce_ms, scroll_threshold_px, ..Self::default() }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
