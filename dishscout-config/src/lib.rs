//! Loader for Dishscout configuration with YAML + environment overlays.
//!
//! Sources are merged in order: an optional `dishscout.yaml`, any inline YAML
//! snippets, then `DISHSCOUT__<SECTION>__<KEY>` environment variables. String
//! values are expanded for `${VAR}` placeholders afterwards, so a file can
//! reference `${GEMINI_API_KEY}` without ever containing the secret.
//!
//! Every key has a default; an empty configuration is valid and yields a
//! client without an API key, which the application reports as a
//! configuration notice rather than failing to start.
use config::{Config, Environment, File};
use dishscout_common::observability::LogFormat;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

/// Environment variables consulted when `llm.api_key` is not configured.
pub const API_KEY_FALLBACK_VARS: &[&str] = &["GEMINI_API_KEY", "API_KEY"];

pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_RESULT_COUNT: u32 = 20;

#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DishscoutConfig {
    pub version: Option<String>,
    pub llm: LlmSettings,
    pub search: SearchSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Gemini,
}

/// Settings for the hosted model. The key is a secret and never logged.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub provider: LlmProvider,
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub timeout_secs: u64,
    pub maps_grounding: bool,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Gemini,
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            maps_grounding: true,
        }
    }
}

impl std::fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSettings")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .field("maps_grounding", &self.maps_grounding)
            .finish()
    }
}

impl LlmSettings {
    /// The usable API key, if any.
    ///
    /// Falls back to [`API_KEY_FALLBACK_VARS`] when the configured value is
    /// missing. Blank values and placeholders that survived expansion (an
    /// unset `${VAR}`) count as absent.
    pub fn api_key(&self) -> Option<String> {
        self.api_key
            .as_deref()
            .and_then(usable_secret)
            .or_else(|| {
                API_KEY_FALLBACK_VARS
                    .iter()
                    .filter_map(|var| std::env::var(var).ok())
                    .find_map(|raw| usable_secret(&raw))
            })
    }
}

fn usable_secret(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.contains("${") {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Shape of the recommendation list requested from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Number of restaurants requested per search (5 or 20 in practice).
    pub result_count: u32,
    /// Ask the model to link every restaurant name to a web search.
    pub require_links: bool,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            result_count: DEFAULT_RESULT_COUNT,
            require_links: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub dir: Option<PathBuf>,
    pub format: LogFormat,
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            dir: None,
            format: LogFormat::Text,
            filter: "info".to_string(),
        }
    }
}

impl DishscoutConfig {
    /// Reject settings that cannot produce a working search.
    ///
    /// A missing API key is not an error here; see [`LlmSettings::api_key`].
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.search.result_count == 0 {
            return Err(SettingsError::Invalid(
                "search.result_count must be at least 1".into(),
            ));
        }
        if self.llm.timeout_secs == 0 {
            return Err(SettingsError::Invalid(
                "llm.timeout_secs must be at least 1".into(),
            ));
        }
        if self.llm.model.trim().is_empty() {
            return Err(SettingsError::Invalid("llm.model must not be empty".into()));
        }
        if !self.llm.endpoint.starts_with("http://") && !self.llm.endpoint.starts_with("https://")
        {
            return Err(SettingsError::Invalid(format!(
                "llm.endpoint must be an http(s) URL, got '{}'",
                self.llm.endpoint
            )));
        }
        Ok(())
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct DishscoutConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for DishscoutConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DishscoutConfigLoader {
    /// Start empty. `DISHSCOUT__` env overrides are applied in [`load`](Self::load),
    /// after every file and snippet, so they always win.
    ///
    /// ```
    /// use dishscout_config::DishscoutConfigLoader;
    ///
    /// let config = DishscoutConfigLoader::new()
    ///     .with_yaml_str("version: '1'")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert_eq!(config.search.result_count, 20);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a required YAML/TOML/JSON file; the format is inferred by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that may be absent, for the default `dishscout.yaml`.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet (tests and embedded defaults).
    ///
    /// ```
    /// use dishscout_config::DishscoutConfigLoader;
    ///
    /// let cfg = DishscoutConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// search:
    ///   result_count: 5
    ///   require_links: true
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.search.result_count, 5);
    /// assert!(cfg.search.require_links);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder, expand `${VAR}` placeholders, and validate.
    pub fn load(self) -> Result<DishscoutConfig, SettingsError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix("DISHSCOUT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: DishscoutConfig = serde_json::from_value(v)
            .map_err(|e| SettingsError::Load(config::ConfigError::Message(e.to_string())))?;
        typed.validate()?;

        Ok(typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_nested_placeholders() {
        temp_env::with_vars(
            [("CITY", Some("Penang")), ("GREETING", Some("hi-${CITY}"))],
            || {
                let mut v = json!({ "a": ["${GREETING}", 3], "b": "$CITY" });
                expand_env_in_value(&mut v);
                assert_eq!(v, json!({ "a": ["hi-Penang", 3], "b": "Penang" }));
            },
        );
    }

    #[test]
    fn cyclic_placeholders_terminate() {
        temp_env::with_vars([("LOOP_A", Some("${LOOP_B}")), ("LOOP_B", Some("${LOOP_A}"))], || {
            let mut v = json!("k=${LOOP_A}");
            expand_env_in_value(&mut v);
            assert!(v.as_str().unwrap().contains("${"));
        });
    }

    #[test]
    fn empty_configuration_uses_defaults() {
        let cfg = DishscoutConfigLoader::new().load().unwrap();
        assert_eq!(cfg.llm.provider, LlmProvider::Gemini);
        assert_eq!(cfg.llm.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(cfg.llm.timeout_secs, 30);
        assert!(cfg.llm.maps_grounding);
        assert_eq!(cfg.search, SearchSettings::default());
        assert_eq!(cfg.logging.format, LogFormat::Text);
    }

    #[test]
    fn zero_result_count_is_rejected() {
        let err = DishscoutConfigLoader::new()
            .with_yaml_str("search:\n  result_count: 0\n")
            .load()
            .unwrap_err();
        assert!(matches!(err, SettingsError::Invalid(_)));
    }

    #[test]
    fn non_http_endpoint_is_rejected() {
        let err = DishscoutConfigLoader::new()
            .with_yaml_str("llm:\n  endpoint: ftp://example.com\n")
            .load()
            .unwrap_err();
        assert!(err.to_string().contains("llm.endpoint"));
    }

    #[test]
    fn unexpanded_placeholder_is_not_a_key() {
        temp_env::with_vars(
            [
                ("DISHSCOUT_TEST_MISSING_KEY", None::<&str>),
                ("GEMINI_API_KEY", None),
                ("API_KEY", None),
            ],
            || {
                let settings = LlmSettings {
                    api_key: Some("${DISHSCOUT_TEST_MISSING_KEY}".into()),
                    ..LlmSettings::default()
                };
                assert_eq!(settings.api_key(), None);
            },
        );
    }

    #[test]
    fn falls_back_to_gemini_env_var() {
        temp_env::with_vars(
            [("GEMINI_API_KEY", Some(" from-env ")), ("API_KEY", None)],
            || {
                let settings = LlmSettings::default();
                assert_eq!(settings.api_key().as_deref(), Some("from-env"));
            },
        );
    }

    #[test]
    fn configured_key_beats_env() {
        temp_env::with_var("GEMINI_API_KEY", Some("env-key"), || {
            let settings = LlmSettings {
                api_key: Some("file-key".into()),
                ..LlmSettings::default()
            };
            assert_eq!(settings.api_key().as_deref(), Some("file-key"));
        });
    }

    #[test]
    fn debug_output_redacts_key() {
        let settings = LlmSettings {
            api_key: Some("super-secret".into()),
            ..LlmSettings::default()
        };
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
