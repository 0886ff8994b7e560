use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub concurrency: ConcurrencyConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    /// "*" allows any origin.
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origin: default_allowed_origin(),
        }
    }
}

fn default_allowed_origin() -> String {
    "*".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            pool_size: default_pool_size(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("slidesmith.db")
}
fn default_pool_size() -> usize {
    8
}

/// API-key allow-list. Empty list means open mode: every request passes.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AuthConfig {
    #[serde(default)]
    pub api_keys: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitConfig {
    #[serde(default = "default_per_minute")]
    pub requests_per_minute: u64,
    #[serde(default = "default_per_hour")]
    pub requests_per_hour: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: default_per_minute(),
            requests_per_hour: default_per_hour(),
        }
    }
}

fn default_per_minute() -> u64 {
    60
}
fn default_per_hour() -> u64 {
    1000
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConcurrencyConfig {
    #[serde(default = "default_max_global")]
    pub max_concurrent_requests: usize,
    #[serde(default = "default_max_per_user")]
    pub max_concurrent_per_user: usize,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: default_max_global(),
            max_concurrent_per_user: default_max_per_user(),
            acquire_timeout_secs: default_acquire_timeout(),
        }
    }
}

fn default_max_global() -> usize {
    100
}
fn default_max_per_user() -> usize {
    10
}
fn default_acquire_timeout() -> u64 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// When set, the OpenAI-backed generator is bound at startup.
    #[serde(default)]
    pub openai_api_key: String,
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_format_temperature")]
    pub format_temperature: f64,
    #[serde(default = "default_title_max_tokens")]
    pub title_max_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            openai_api_key: String::new(),
            openai_model: default_openai_model(),
            openai_base_url: default_openai_base_url(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            format_temperature: default_format_temperature(),
            title_max_tokens: default_title_max_tokens(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}
fn default_openai_model() -> String {
    "gpt-3.5-turbo".to_string()
}
fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_max_tokens() -> u32 {
    1500
}
fn default_temperature() -> f64 {
    0.7
}
// Lower temperature for the reformat call keeps the JSON shape stable.
fn default_format_temperature() -> f64 {
    0.3
}
fn default_title_max_tokens() -> u32 {
    100
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_entity_capacity")]
    pub entity_capacity: u64,
    #[serde(default = "default_entity_ttl")]
    pub entity_ttl_secs: u64,
    #[serde(default = "default_generation_capacity")]
    pub generation_capacity: u64,
    #[serde(default = "default_generation_ttl")]
    pub generation_ttl_secs: u64,
    #[serde(default = "default_response_capacity")]
    pub response_capacity: u64,
    #[serde(default = "default_response_ttl")]
    pub response_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            entity_capacity: default_entity_capacity(),
            entity_ttl_secs: default_entity_ttl(),
            generation_capacity: default_generation_capacity(),
            generation_ttl_secs: default_generation_ttl(),
            response_capacity: default_response_capacity(),
            response_ttl_secs: default_response_ttl(),
        }
    }
}

fn default_entity_capacity() -> u64 {
    100
}
fn default_entity_ttl() -> u64 {
    3600
}
fn default_generation_capacity() -> u64 {
    200
}
fn default_generation_ttl() -> u64 {
    1800
}
fn default_response_capacity() -> u64 {
    500
}
fn default_response_ttl() -> u64 {
    900
}

impl AppConfig {
    /// Sanity-check numeric bounds before the server starts.
    pub fn validate(&self) -> Result<(), String> {
        if self.rate_limit.requests_per_minute == 0 || self.rate_limit.requests_per_hour == 0 {
            return Err("rate_limit ceilings must be greater than zero".to_string());
        }
        if self.concurrency.max_concurrent_requests == 0
            || self.concurrency.max_concurrent_per_user == 0
        {
            return Err("concurrency limits must be greater than zero".to_string());
        }
        Ok(())
    }

    pub fn load(config_path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = Config::builder();

        // Load from config file
        let path = config_path.unwrap_or("config.toml");
        builder = builder.add_source(File::with_name(path).required(false));

        // Overlay with environment variables (SLIDESMITH__SERVER__PORT=8001, etc.)
        builder = builder.add_source(
            Environment::with_prefix("SLIDESMITH")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("auth.api_keys"),
        );

        builder.build()?.try_deserialize()
    }
}
