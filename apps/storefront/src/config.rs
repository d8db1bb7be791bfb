use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use client_core::CatalogConfig;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "storefront.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub search_debounce_ms: u64,
    pub price_debounce_ms: u64,
    pub page_limit: u32,
    pub suggestion_limit: u32,
}

impl Default for Settings {
    fn default() -> Self {
        let catalog = CatalogConfig::default();
        Self {
            api_base_url: "http://127.0.0.1:5000/api".into(),
            request_timeout_secs: 15,
            search_debounce_ms: catalog.search_debounce.as_millis() as u64,
            price_debounce_ms: catalog.price_debounce.as_millis() as u64,
            page_limit: catalog.page_limit,
            suggestion_limit: catalog.suggestion_limit,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base_url: Option<String>,
    request_timeout_secs: Option<u64>,
    search_debounce_ms: Option<u64>,
    price_debounce_ms: Option<u64>,
    page_limit: Option<u32>,
    suggestion_limit: Option<u32>,
}

impl Settings {
    pub fn catalog_config(&self) -> CatalogConfig {
        CatalogConfig {
            search_debounce: Duration::from_millis(self.search_debounce_ms),
            price_debounce: Duration::from_millis(self.price_debounce_ms),
            page_limit: self.page_limit.max(1),
            suggestion_limit: self.suggestion_limit,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// Defaults, then `path` if it exists, then environment overrides.
pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        apply_file(&mut settings, &raw)
            .with_context(|| format!("invalid config file '{}'", path.display()))?;
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;
    if let Some(v) = file_cfg.api_base_url {
        settings.api_base_url = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = v;
    }
    if let Some(v) = file_cfg.search_debounce_ms {
        settings.search_debounce_ms = v;
    }
    if let Some(v) = file_cfg.price_debounce_ms {
        settings.price_debounce_ms = v;
    }
    if let Some(v) = file_cfg.page_limit {
        settings.page_limit = v;
    }
    if let Some(v) = file_cfg.suggestion_limit {
        settings.suggestion_limit = v;
    }
    Ok(())
}

fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("STOREFRONT_API_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = lookup("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
        settings.request_timeout_secs = v;
    }
    if let Some(v) = lookup("APP__SEARCH_DEBOUNCE_MS").and_then(|v| v.parse().ok()) {
        settings.search_debounce_ms = v;
    }
    if let Some(v) = lookup("APP__PRICE_DEBOUNCE_MS").and_then(|v| v.parse().ok()) {
        settings.price_debounce_ms = v;
    }
    if let Some(v) = lookup("APP__PAGE_LIMIT").and_then(|v| v.parse().ok()) {
        settings.page_limit = v;
    }
    if let Some(v) = lookup("APP__SUGGESTION_LIMIT").and_then(|v| v.parse().ok()) {
        settings.suggestion_limit = v;
    }
}
