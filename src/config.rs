use serde::{Deserialize, Serialize};

pub const DEFAULT_QUERY: &str = "popular latest hackathons 2024 2025 unstop devfolio hackerearth";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address
    pub bind_addr: String,
    /// SQLite connection string, e.g. "sqlite:hackathons.db?mode=rwc"
    pub database_url: String,
    /// LLM provider configuration
    pub llm: LlmConfig,
    /// Maximum number of records kept from one search
    pub result_limit: usize,
    /// Query used when a search request carries none
    pub default_query: String,
    /// Interval for the background refresh in hours (None = disabled)
    pub auto_scrape_hours: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "gemini" or "openai"
    pub provider: String,
    /// Base URL for the LLM API
    pub base_url: String,
    /// Model name used for the search completion
    pub model: String,
    /// API key, required by both providers
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub temperature: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".to_string(),
            database_url: "sqlite:hackathons.db?mode=rwc".to_string(),
            llm: LlmConfig::default(),
            result_limit: 10,
            default_query: DEFAULT_QUERY.to_string(),
            auto_scrape_hours: None,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key: None,
            temperature: 0.2,
        }
    }
}

impl Config {
    /// Build the config from process environment, loading `.env` first when
    /// one exists in the working directory.
    pub fn from_env() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup("HACKATHON_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(url) = lookup("DATABASE_URL") {
            config.database_url = url;
        }
        if let Some(provider) = lookup("LLM_PROVIDER") {
            config.llm.provider = provider.to_lowercase();
        }
        if let Some(url) = lookup("LLM_BASE_URL") {
            config.llm.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(model) = lookup("LLM_MODEL") {
            config.llm.model = model;
        }
        config.llm.api_key = lookup("LLM_API_KEY")
            .or_else(|| lookup("GOOGLE_API_KEY"))
            .filter(|key| !key.trim().is_empty());
        if let Some(val) = lookup("LLM_TEMPERATURE") {
            if let Ok(t) = val.parse::<f32>() {
                config.llm.temperature = t.clamp(0.0, 2.0);
            }
        }
        if let Some(val) = lookup("HACKATHON_RESULT_LIMIT") {
            if let Ok(v) = val.parse::<usize>() {
                if v > 0 {
                    config.result_limit = v;
                }
            }
        }
        if let Some(query) = lookup("HACKATHON_DEFAULT_QUERY") {
            if !query.trim().is_empty() {
                config.default_query = query;
            }
        }
        if let Some(val) = lookup("HACKATHON_AUTO_SCRAPE_HOURS") {
            config.auto_scrape_hours = val.parse::<u64>().ok().filter(|h| *h > 0);
        }

        config
    }
}
