use serde::{Deserialize, Serialize};

use std::{env, fs, path::Path, time::Duration};

use crate::pagination::DEFAULT_PAGE_SIZE;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,
    pub supabase: SupabaseConfig,
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub notes: NotesConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
    /// Where the OAuth provider sends the browser back to after sign-in.
    #[serde(default)]
    pub oauth_redirect_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
    pub api_key: String,
    #[serde(default = "default_gemini_model")]
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotesConfig {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_cache_ttl", with = "humantime_serde")]
    pub cache_ttl: Duration,
}

impl Default for NotesConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            cache_ttl: default_cache_ttl(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_session_ttl", with = "humantime_serde")]
    pub session_ttl: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl: default_session_ttl(),
        }
    }
}

const fn default_port() -> u16 {
    8000
}

const fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_gemini_base_url() -> String {
    DEFAULT_GEMINI_BASE_URL.to_string()
}

fn default_gemini_model() -> String {
    DEFAULT_GEMINI_MODEL.to_string()
}

const fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

const fn default_cache_ttl() -> Duration {
    Duration::from_secs(30)
}

const fn default_session_ttl() -> Duration {
    Duration::from_secs(60)
}

/// Flat view of the environment, `SUPABASE_URL` maps to `supabase_url` etc.
#[derive(Debug, Deserialize)]
struct EnvConfig {
    supabase_url: String,
    supabase_anon_key: String,
    gemini_api_key: String,
    port: Option<u16>,
    oauth_redirect_url: Option<String>,
    gemini_model: Option<String>,
    gemini_base_url: Option<String>,
    notes_page_size: Option<u32>,
}

impl From<EnvConfig> for Config {
    fn from(vars: EnvConfig) -> Self {
        Self {
            port: vars.port.unwrap_or_else(default_port),
            request_timeout: default_request_timeout(),
            supabase: SupabaseConfig {
                url: vars.supabase_url,
                anon_key: vars.supabase_anon_key,
                oauth_redirect_url: vars.oauth_redirect_url,
            },
            gemini: GeminiConfig {
                base_url: vars.gemini_base_url.unwrap_or_else(default_gemini_base_url),
                api_key: vars.gemini_api_key,
                model: vars.gemini_model.unwrap_or_else(default_gemini_model),
            },
            notes: NotesConfig {
                page_size: vars.notes_page_size.unwrap_or_else(default_page_size),
                ..NotesConfig::default()
            },
            auth: AuthConfig::default(),
        }
    }
}

pub fn parse_config(contents: &str) -> Result<Config, serde_yaml::Error> {
    serde_yaml::from_str(contents)
}

fn read_config(path: &str) -> Result<Config, Box<dyn std::error::Error>> {
    let contents = fs::read_to_string(path)?;
    parse_config(&contents).map_err(Into::into)
}

fn from_vars<I>(vars: I) -> Result<Config, envy::Error>
where
    I: IntoIterator<Item = (String, String)>,
{
    envy::from_iter::<_, EnvConfig>(vars).map(Config::from)
}

/// Files tried in order: an explicit `NOTES_CONFIG` path first, then the
/// local `config.yaml` and the shipped example.
fn config_candidates(explicit: Option<String>) -> Vec<String> {
    let mut candidates: Vec<String> = explicit.into_iter().collect();
    for fallback in ["config.yaml", "config.example.yaml"] {
        if !candidates.iter().any(|c| c == fallback) {
            candidates.push(fallback.to_string());
        }
    }
    candidates
}

pub fn load_config() -> Result<Config, Box<dyn std::error::Error>> {
    let explicit = env::var("NOTES_CONFIG").ok();
    if let Some(path) = explicit.as_deref().filter(|p| !Path::new(p).exists()) {
        tracing::warn!("NOTES_CONFIG points at missing file '{path}', ignoring it");
    }

    let candidates = config_candidates(explicit);
    if let Some(path) = candidates.iter().find(|p| Path::new(p).exists()) {
        if path == "config.example.yaml" {
            tracing::warn!(
                "Reading placeholder settings from 'config.example.yaml', \
                 supabase and gemini keys there are not real"
            );
        }
        tracing::debug!("Reading notes server settings from '{path}'");
        return read_config(path);
    }

    tracing::info!("No settings file present, reading SUPABASE_* and GEMINI_* variables");
    from_vars(env::vars()).map_err(|e| {
        Box::<dyn std::error::Error>::from(format!(
            "notes server is not configured: none of {candidates:?} exist \
             and the environment is missing a required variable ({e})"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn yaml_with_only_required_keys_gets_defaults() {
        let cfg = parse_config(
            r"
supabase:
  url: https://project.supabase.co
  anon_key: anon
gemini:
  api_key: secret
",
        )
        .unwrap();

        assert_eq!(cfg.port, 8000);
        assert_eq!(cfg.request_timeout, Duration::from_secs(30));
        assert_eq!(cfg.gemini.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(cfg.gemini.base_url, DEFAULT_GEMINI_BASE_URL);
        assert_eq!(cfg.notes.page_size, 5);
        assert_eq!(cfg.notes.cache_ttl, Duration::from_secs(30));
        assert_eq!(cfg.auth.session_ttl, Duration::from_secs(60));
        assert!(cfg.supabase.oauth_redirect_url.is_none());
    }

    #[test]
    fn yaml_durations_are_humantime() {
        let cfg = parse_config(
            r"
port: 9100
request_timeout: 5s
supabase:
  url: https://project.supabase.co
  anon_key: anon
  oauth_redirect_url: https://notes.example.com/dashboard
gemini:
  api_key: secret
  model: gemini-1.5-pro
notes:
  page_size: 10
  cache_ttl: 2m
auth:
  session_ttl: 0s
",
        )
        .unwrap();

        assert_eq!(cfg.port, 9100);
        assert_eq!(cfg.request_timeout, Duration::from_secs(5));
        assert_eq!(cfg.notes.page_size, 10);
        assert_eq!(cfg.notes.cache_ttl, Duration::from_secs(120));
        assert_eq!(cfg.auth.session_ttl, Duration::ZERO);
        assert_eq!(cfg.gemini.model, "gemini-1.5-pro");
    }

    #[test]
    fn missing_supabase_section_is_an_error() {
        assert!(parse_config("gemini:\n  api_key: secret\n").is_err());
    }

    #[test]
    fn environment_fallback() {
        let cfg = from_vars(vars(&[
            ("SUPABASE_URL", "https://project.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon"),
            ("GEMINI_API_KEY", "secret"),
            ("PORT", "8080"),
            ("NOTES_PAGE_SIZE", "7"),
        ]))
        .unwrap();

        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.supabase.anon_key, "anon");
        assert_eq!(cfg.gemini.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(cfg.notes.page_size, 7);
    }

    #[test]
    fn environment_without_keys_is_incomplete() {
        assert!(from_vars(vars(&[("SUPABASE_URL", "https://project.supabase.co")])).is_err());
    }

    #[test]
    fn explicit_config_path_is_tried_first() {
        assert_eq!(
            config_candidates(Some("/etc/notes/prod.yaml".to_string())),
            vec!["/etc/notes/prod.yaml", "config.yaml", "config.example.yaml"]
        );
        assert_eq!(
            config_candidates(Some("config.yaml".to_string())),
            vec!["config.yaml", "config.example.yaml"]
        );
        assert_eq!(
            config_candidates(None),
            vec!["config.yaml", "config.example.yaml"]
        );
    }
}
