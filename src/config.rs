use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, warn, Level};

use crate::models::Provider;

pub const OPENAI_KEY_VAR: &str = "OPENAI_API_KEY";
pub const ANTHROPIC_KEY_VAR: &str = "ANTHROPIC_API_KEY";
pub const GOOGLE_KEY_VAR: &str = "GOOGLE_API_KEY";

const DEFAULT_KEY_FILE: &str = "nocommit_key.txt";

fn env(key: &str) -> Option<String> {
    dotenv::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env(key).and_then(|s| s.parse().ok()).unwrap_or(default)
}

fn env_secs(key: &str, default: Duration) -> Duration {
    env(key)
        .and_then(|s| s.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

/// `LOG_LEVEL`, readable before the subscriber is installed.
pub fn log_level() -> Level {
    env_parse("LOG_LEVEL", Level::INFO)
}

/// Provider credentials. A missing key disables that provider's models.
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    pub openai: Option<String>,
    pub anthropic: Option<String>,
    pub google: Option<String>,
}

impl ApiKeys {
    /// Environment first, then the plaintext key file.
    pub fn load(key_file: Option<&Path>) -> Self {
        let file_keys = key_file
            .and_then(|path| match read_key_file(path) {
                Ok(keys) => {
                    debug!(path = %path.display(), count = keys.len(), "key file loaded");
                    Some(keys)
                }
                Err(e) => {
                    warn!(path = %path.display(), "ignoring key file: {e:#}");
                    None
                }
            })
            .unwrap_or_default();

        let pick = |var: &str| env(var).or_else(|| file_keys.get(var).cloned());
        Self {
            openai: pick(OPENAI_KEY_VAR),
            anthropic: pick(ANTHROPIC_KEY_VAR),
            google: pick(GOOGLE_KEY_VAR),
        }
    }

    pub fn get(&self, provider: Provider) -> Option<&str> {
        match provider {
            Provider::OpenAi => self.openai.as_deref(),
            Provider::Anthropic => self.anthropic.as_deref(),
            Provider::Google => self.google.as_deref(),
            Provider::Local => None,
        }
    }
}

/// Read `KEY=VALUE` lines. A file holding one bare value is the OpenAI key.
pub fn read_key_file(path: &Path) -> Result<HashMap<String, String>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read key file {}", path.display()))?;
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return Ok(HashMap::new());
    }
    if !trimmed.contains('=') {
        return Ok(HashMap::from([(OPENAI_KEY_VAR.to_string(), trimmed.to_string())]));
    }

    let mut keys = HashMap::new();
    for entry in dotenv::from_path_iter(path).context("Failed to open key file")? {
        match entry {
            Ok((key, value)) if !value.trim().is_empty() => {
                keys.insert(key.trim().to_string(), value.trim().to_string());
            }
            Ok(_) => {}
            Err(e) => warn!(path = %path.display(), "skipping malformed key line: {}", e),
        }
    }
    Ok(keys)
}

fn find_key_file() -> Option<PathBuf> {
    if let Some(path) = env("KEY_FILE") {
        return Some(PathBuf::from(path));
    }
    [PathBuf::from(DEFAULT_KEY_FILE), Path::new("..").join(DEFAULT_KEY_FILE)]
        .into_iter()
        .find(|p| p.is_file())
}

/// Base URLs for every upstream. Overridable so tests can point at stubs.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub openai: String,
    pub anthropic: String,
    pub gemini: String,
    pub local: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            openai: "https://api.openai.com".to_string(),
            anthropic: "https://api.anthropic.com".to_string(),
            gemini: "https://generativelanguage.googleapis.com".to_string(),
            local: "http://localhost:8000".to_string(),
        }
    }
}

impl Endpoints {
    /// Every provider served from one base URL (stub servers in tests).
    pub fn all(base: &str) -> Self {
        Self {
            openai: base.to_string(),
            anthropic: base.to_string(),
            gemini: base.to_string(),
            local: base.to_string(),
        }
    }
}

/// Process-wide settings read once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: String,
    pub keys: ApiKeys,
    pub endpoints: Endpoints,
    pub local_enabled: bool,
    pub llm_timeout: Duration,
    pub local_retry_delay: Duration,
    pub max_upload_bytes: usize,
    /// Sessions idle for longer than this are dropped.
    pub session_ttl: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8501".to_string(),
            keys: ApiKeys::default(),
            endpoints: Endpoints::default(),
            local_enabled: false,
            llm_timeout: Duration::from_secs(60),
            local_retry_delay: Duration::from_secs(3),
            max_upload_bytes: 50 * 1024 * 1024,
            session_ttl: Duration::from_secs(2 * 60 * 60),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        let defaults = Settings::default();
        let endpoints = Endpoints {
            openai: env("OPENAI_BASE_URL").unwrap_or(defaults.endpoints.openai),
            anthropic: env("ANTHROPIC_BASE_URL").unwrap_or(defaults.endpoints.anthropic),
            gemini: env("GEMINI_BASE_URL").unwrap_or(defaults.endpoints.gemini),
            local: env("LOCAL_LLM_BASE_URL").unwrap_or(defaults.endpoints.local),
        };

        let keys = ApiKeys::load(find_key_file().as_deref());
        for (var, present) in [
            (OPENAI_KEY_VAR, keys.openai.is_some()),
            (ANTHROPIC_KEY_VAR, keys.anthropic.is_some()),
            (GOOGLE_KEY_VAR, keys.google.is_some()),
        ] {
            if present {
                info!(var, "API key configured");
            } else {
                warn!(var, "API key missing; models for this provider are disabled");
            }
        }

        Self {
            bind_addr: env("BIND_ADDR").unwrap_or(defaults.bind_addr),
            keys,
            endpoints,
            local_enabled: env_parse("LOCAL_LLM_ENABLED", defaults.local_enabled),
            llm_timeout: env_secs("LLM_TIMEOUT_SECS", defaults.llm_timeout),
            local_retry_delay: env_secs("LOCAL_RETRY_DELAY_SECS", defaults.local_retry_delay),
            max_upload_bytes: env_parse("MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
            session_ttl: env_secs("SESSION_TTL_SECS", defaults.session_ttl),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_come_from_seconds_vars() {
        std::env::set_var("LOCAL_RETRY_DELAY_SECS", "7");
        std::env::set_var("SESSION_TTL_SECS", "900");
        std::env::set_var("LLM_TIMEOUT_SECS", "not a number");
        let settings = Settings::from_env();
        std::env::remove_var("LOCAL_RETRY_DELAY_SECS");
        std::env::remove_var("SESSION_TTL_SECS");
        std::env::remove_var("LLM_TIMEOUT_SECS");

        assert_eq!(settings.local_retry_delay, Duration::from_secs(7));
        assert_eq!(settings.session_ttl, Duration::from_secs(900));
        assert_eq!(settings.llm_timeout, Settings::default().llm_timeout);
    }

    fn temp_file(contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("keys-{}.txt", uuid::Uuid::new_v4()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn reads_key_value_lines() {
        let path = temp_file("OPENAI_API_KEY=sk-test\nGOOGLE_API_KEY=g-key\n");
        let keys = read_key_file(&path).unwrap();
        assert_eq!(keys.get("OPENAI_API_KEY").map(String::as_str), Some("sk-test"));
        assert_eq!(keys.get("GOOGLE_API_KEY").map(String::as_str), Some("g-key"));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn bare_value_is_openai_key() {
        let path = temp_file("  sk-bare-value \n");
        let keys = read_key_file(&path).unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys.get(OPENAI_KEY_VAR).map(String::as_str), Some("sk-bare-value"));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn missing_file_is_an_error() {
        let path = std::env::temp_dir().join("definitely-not-here-keys.txt");
        assert!(read_key_file(&path).is_err());
    }

    #[test]
    fn local_provider_never_needs_a_key() {
        let keys = ApiKeys {
            openai: Some("k".into()),
            ..Default::default()
        };
        assert_eq!(keys.get(Provider::OpenAi), Some("k"));
        assert_eq!(keys.get(Provider::Anthropic), None);
        assert_eq!(keys.get(Provider::Local), None);
    }
}
