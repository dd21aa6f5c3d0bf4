//! TOML configuration parsing and validation.
//!
//! Every section is optional; missing sections take the defaults below.
//!
//! ```toml
//! [recipes]
//! dir = "data/Recipes"
//! extensions = ["json"]
//! recursive = false
//! seed_sample = true
//!
//! [server]
//! bind = "0.0.0.0:10000"
//! max_sessions = 1024
//!
//! [answer]
//! provider = "disabled"      # or "openai"
//! model = "gpt-4o-mini"
//! ```

use anyhow::{Context, Result};
use guided_kitchen_core::session::DEFAULT_MAX_SESSIONS;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub recipes: RecipesConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub answer: AnswerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RecipesConfig {
    #[serde(default = "default_recipes_dir")]
    pub dir: PathBuf,
    /// File extensions (without the dot) treated as recipe documents.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub recursive: bool,
    /// Create the directory with a sample recipe when it does not exist.
    #[serde(default = "default_seed_sample")]
    pub seed_sample: bool,
}

impl Default for RecipesConfig {
    fn default() -> Self {
        Self {
            dir: default_recipes_dir(),
            extensions: default_extensions(),
            recursive: false,
            seed_sample: default_seed_sample(),
        }
    }
}

fn default_recipes_dir() -> PathBuf {
    PathBuf::from("data").join("Recipes")
}
fn default_extensions() -> Vec<String> {
    vec!["json".to_string()]
}
fn default_seed_sample() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Sessions kept besides the default one. Creating more evicts the least
    /// recently used.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_sessions: default_max_sessions(),
        }
    }
}

fn default_max_sessions() -> usize {
    DEFAULT_MAX_SESSIONS
}

fn default_bind() -> String {
    "0.0.0.0:10000".to_string()
}

impl ServerConfig {
    /// The bind address, with the port replaced by `PORT` when that
    /// environment variable holds a valid port number.
    pub fn effective_bind(&self) -> String {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.trim().parse::<u16>().ok());
        match port {
            Some(port) => with_port(&self.bind, port),
            None => self.bind.clone(),
        }
    }
}

fn with_port(bind: &str, port: u16) -> String {
    match bind.rsplit_once(':') {
        Some((host, _)) => format!("{}:{}", host, port),
        None => format!("{}:{}", bind, port),
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnswerConfig {
    /// `disabled` or `openai`.
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Generated answers of at most this many characters count as unavailable.
    #[serde(default = "default_min_answer_chars")]
    pub min_answer_chars: usize,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_base: default_api_base(),
            system_prompt: default_system_prompt(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            min_answer_chars: default_min_answer_chars(),
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_system_prompt() -> String {
    "You are a helpful Ugandan cooking assistant.".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    2
}
fn default_min_answer_chars() -> usize {
    10
}

impl AnswerConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

impl Config {
    /// Built-in defaults, used when no config file exists.
    pub fn minimal() -> Self {
        Self::default()
    }
}

/// Read and validate a config file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Like [`load_config`], but a missing file yields [`Config::minimal`].
pub fn load_config_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Ok(Config::minimal())
    }
}

fn validate(config: &Config) -> Result<()> {
    if config.recipes.extensions.is_empty() {
        anyhow::bail!("recipes.extensions must list at least one extension");
    }
    if config
        .recipes
        .extensions
        .iter()
        .any(|e| e.trim().trim_start_matches('.').is_empty())
    {
        anyhow::bail!("recipes.extensions must not contain empty entries");
    }

    if config.server.max_sessions == 0 {
        anyhow::bail!("server.max_sessions must be at least 1");
    }

    match config.answer.provider.as_str() {
        "disabled" | "openai" => {}
        other => anyhow::bail!(
            "Unknown answer provider: '{}'. Must be disabled or openai.",
            other
        ),
    }

    if config.answer.is_enabled() && config.answer.model.trim().is_empty() {
        anyhow::bail!(
            "answer.model must be specified when provider is '{}'",
            config.answer.provider
        );
    }

    Ok(())
}
