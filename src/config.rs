//! Configuration types, read from the environment.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::generator::GeneratorConfig;
use crate::llm::{LlmBackend, LlmConfig};

/// Everything the binary needs to wire the workflow together.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub generator: GeneratorConfig,
    /// Port for the HTTP transport; `None` runs the CLI only.
    pub http_port: Option<u16>,
    /// Directory for daily-rolling log files; `None` logs to stderr only.
    pub log_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary lookup, so tests need not touch the process
    /// environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let backend = match get("BRAND_GEN_BACKEND") {
            Some(value) => LlmBackend::from_str(&value)?,
            None => LlmBackend::Anthropic,
        };

        let key_var = backend.api_key_var();
        let api_key = get(key_var).ok_or_else(|| ConfigError::MissingEnvVar(key_var.to_string()))?;

        let model = get("BRAND_GEN_MODEL").unwrap_or_else(|| backend.default_model().to_string());

        let defaults = GeneratorConfig::default();
        let generator = GeneratorConfig {
            temperature: parse_or(get("BRAND_GEN_TEMPERATURE"), defaults.temperature),
            max_tokens: parse_or(get("BRAND_GEN_MAX_TOKENS"), defaults.max_tokens),
            timeout: Duration::from_secs(parse_or(
                get("BRAND_GEN_TIMEOUT_SECS"),
                defaults.timeout.as_secs(),
            )),
            ..defaults
        };

        let http_port = match get("BRAND_GEN_HTTP_PORT") {
            Some(port) => Some(port.parse::<u16>().map_err(|e| ConfigError::InvalidValue {
                key: "BRAND_GEN_HTTP_PORT".to_string(),
                message: e.to_string(),
            })?),
            None => None,
        };

        Ok(Self {
            llm: LlmConfig {
                backend,
                api_key: SecretString::from(api_key),
                model,
                base_url: get("BRAND_GEN_BASE_URL"),
            },
            generator,
            http_port,
            log_dir: get("BRAND_GEN_LOG_DIR").map(PathBuf::from),
        })
    }

    /// Whether to run the interactive REPL. With HTTP enabled and no terminal
    /// on stdin, the server is the only transport.
    pub fn interactive(&self, stdin_is_terminal: bool) -> bool {
        stdin_is_terminal || self.http_port.is_none()
    }
}

/// Parse `value`, falling back to `default` when absent or malformed.
fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    match value {
        Some(v) => v.parse().unwrap_or_else(|_| {
            tracing::warn!(value = %v, "Ignoring unparsable config value, using default");
            default
        }),
        None => default,
    }
}
