//! Loader for Scout configuration with YAML + environment overlays.
//!
//! Sources are merged in this order, later ones winning:
//! built-in defaults, YAML files/snippets in the order they were added, then
//! `SCOUT_`-prefixed environment variables (`SCOUT_REGISTRY__ROW_LIMIT=50`).
//! Placeholders `${VAR}` / `${VAR:-default}` in defaults and files are
//! expanded once, before the environment overrides are applied; neither the
//! substituted text nor the overrides are expanded again. Credentials default
//! to placeholders so a `.env` file or the process environment is enough to
//! run either flow.
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "scout.yaml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoutConfig {
    pub registry: RegistryConfig,
    pub geocoding: GeocodingConfig,
    pub llm: LlmConfig,
    pub instagram: InstagramConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub input_path: PathBuf,
    pub separator: char,
    /// `None` processes every row.
    pub row_limit: Option<usize>,
    pub columns: ColumnNames,
    /// Place types that make a building count as a commercial premise.
    pub commercial_types: Vec<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("data/registre_commerce_vaud.csv"),
            separator: ';',
            row_limit: Some(20),
            columns: ColumnNames::default(),
            commercial_types: ["bakery", "bar", "beauty_salon", "restaurant"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Header names of the registry export.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub address: String,
    pub postal_code: String,
    pub city: String,
    pub description: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            address: "Adresse".into(),
            postal_code: "NPA".into(),
            city: "Localité".into(),
            description: "Objet".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    #[serde(deserialize_with = "lenient_string")]
    pub api_key: String,
    pub base_url: String,
    pub region: Option<String>,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            api_key: "${GOOGLE_MAPS_API_KEY}".into(),
            base_url: "https://maps.googleapis.com".into(),
            region: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub endpoint: String,
    pub model: String,
    /// Overrides the built-in classification prompt.
    pub system_prompt: Option<String>,
    pub attempts: usize,
    pub keep_alive: String,
    pub temperature: f32,
    /// Check the server and pull the model before the first call; failures only warn.
    pub prepare_model: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "${OLLAMA_API_URL:-http://localhost:11434}".into(),
            model: "llama3.2:latest".into(),
            system_prompt: None,
            attempts: 5,
            keep_alive: "30m".into(),
            temperature: 0.0,
            prepare_model: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstagramConfig {
    #[serde(deserialize_with = "lenient_string")]
    pub username: String,
    #[serde(deserialize_with = "lenient_string")]
    pub password: String,
    pub base_url: String,
    pub base_hashtag: String,
    pub search_hashtags: Vec<String>,
    pub search_texts: Vec<String>,
    pub max_posts: usize,
}

impl Default for InstagramConfig {
    fn default() -> Self {
        Self {
            username: "${INSTAGRAM_USERNAME}".into(),
            password: "${INSTAGRAM_PASSWORD}".into(),
            base_url: "https://i.instagram.com".into(),
            base_hashtag: "suisseromande".into(),
            search_hashtags: vec!["handmade".into(), "homemade".into()],
            search_texts: vec!["dm for order".into(), "purchase".into()],
            max_posts: 10,
        }
    }
}

// Env overrides are parsed eagerly, so a numeric password arrives as a number.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Return `value` when it is set, or a configuration error naming `name`.
///
/// A value still holding a `${...}` placeholder counts as unset: the variable
/// it refers to was not in the environment.
///
/// ```
/// use scout_config::require_value;
///
/// assert_eq!(require_value("llm.model", "llama3.2").unwrap(), "llama3.2");
/// assert!(require_value("geocoding.api_key", "${GOOGLE_MAPS_API_KEY}").is_err());
/// assert!(require_value("instagram.password", "  ").is_err());
/// ```
pub fn require_value<'a>(name: &str, value: &'a str) -> Result<&'a str, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.contains("${") {
        return Err(ConfigError::Message(format!(
            "{name} is not set (provide it in {DEFAULT_CONFIG_FILE} or the environment)"
        )));
    }
    Ok(trimmed)
}

/// Expand `${VAR}` / `${VAR:-default}` once; substituted text is kept verbatim.
fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                if let Ok(expanded) = shellexpand::env(s.as_str()) {
                    *s = expanded.into_owned();
                }
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Overlay `top` onto `base`: objects merge key by key, anything else replaces.
fn merge_values(base: &mut Value, top: Value) {
    match (base, top) {
        (Value::Object(base), Value::Object(top)) => {
            for (key, value) in top {
                match base.get_mut(&key) {
                    Some(slot) => merge_values(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct ScoutConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    env_prefix: String,
}

impl Default for ScoutConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoutConfigLoader {
    /// Built-in defaults plus `SCOUT_` env overrides.
    ///
    /// ```
    /// use scout_config::ScoutConfigLoader;
    ///
    /// let cfg = ScoutConfigLoader::new()
    ///     .with_yaml_str("registry:\n  row_limit: 5")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(cfg.registry.row_limit, Some(5));
    /// assert_eq!(cfg.registry.columns.city, "Localité");
    /// assert_eq!(cfg.instagram.base_hashtag, "suisseromande");
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
            env_prefix: "SCOUT".into(),
        }
    }

    /// Use another environment prefix (tests).
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = prefix.to_string();
        self
    }

    /// Attach a required YAML/TOML/JSON file; the `config` crate infers the
    /// format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that may be absent, such as `scout.yaml` in the working
    /// directory.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources.
    ///
    /// ```
    /// use scout_config::ScoutConfigLoader;
    ///
    /// let cfg = ScoutConfigLoader::new()
    ///     .with_yaml_str(r#"
    /// llm:
    ///   endpoint: "${SCOUT_DOC_UNSET_OLLAMA:-http://ollama.internal:11434}"
    ///   attempts: 3
    /// instagram:
    ///   search_texts: ["commande"]
    /// "#)
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(cfg.llm.endpoint, "http://ollama.internal:11434");
    /// assert_eq!(cfg.llm.attempts, 3);
    /// assert_eq!(cfg.llm.model, "llama3.2:latest");
    /// assert_eq!(cfg.instagram.search_texts, vec!["commande"]);
    /// ```
    pub fn load(self) -> Result<ScoutConfig, ConfigError> {
        let files: Value = self.builder.build()?.try_deserialize()?;
        let overrides: Value = Config::builder()
            .add_source(
                Environment::with_prefix(&self.env_prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        let mut merged = serde_json::to_value(ScoutConfig::default())
            .map_err(|e| ConfigError::Message(e.to_string()))?;
        merge_values(&mut merged, files);
        expand_env_in_value(&mut merged);
        merge_values(&mut merged, overrides);

        serde_json::from_value(merged).map_err(|e| ConfigError::Message(e.to_string()))
    }
}
