//! Loader for the server configuration with YAML + environment overlays.
//!
//! Sources are merged in this order (later wins):
//!
//! 1. an optional or required YAML file (`quill.yaml` by default),
//! 2. inline YAML snippets (tests, CLI overrides),
//! 3. `QUILL__SECTION__KEY` environment variables (e.g. `QUILL__LLM__MODEL`).
//!
//! After merging, string values containing `$VAR` / `${VAR}` are expanded from
//! the process environment so secrets can stay out of the file.
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const REDACTED: &str = "<redacted>";

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("failed to read configuration: {0}")]
    Source(#[from] config::ConfigError),
    #[error("configuration has an unexpected shape: {0}")]
    Shape(String),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuillConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Accounts seeded at startup. Tokens are opaque bearer credentials.
    #[serde(default)]
    pub users: Vec<UserSeed>,
    #[serde(default)]
    pub categories: Vec<CategorySeed>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

/// Completion provider settings. Only the OpenAI-compatible chat API is supported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_openai_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            endpoint: default_openai_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `text` or `json`.
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_log_filter")]
    pub filter: String,
    #[serde(default = "default_true")]
    pub stderr: bool,
    #[serde(default)]
    pub dir: Option<String>,
    /// Rotated daily files to keep; unset keeps every file.
    #[serde(default)]
    pub keep_files: Option<usize>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
            filter: default_log_filter(),
            stderr: true,
            dir: None,
            keep_files: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSeed {
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub token: String,
    #[serde(default)]
    pub is_staff: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySeed {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

fn default_bind() -> String {
    "127.0.0.1:8000".into()
}
fn default_database_url() -> String {
    "sqlite://quill.db?mode=rwc".into()
}
fn default_max_connections() -> u32 {
    5
}
fn default_model() -> String {
    "gpt-3.5-turbo".into()
}
fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".into()
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_log_format() -> String {
    "text".into()
}
fn default_log_filter() -> String {
    "info".into()
}
fn default_true() -> bool {
    true
}

impl QuillConfig {
    /// Startup checks that cannot be expressed with serde defaults.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.llm.api_key.trim().is_empty() {
            return Err(ConfigLoadError::Invalid(
                "llm.api_key is required (set it in quill.yaml or QUILL__LLM__API_KEY)".into(),
            ));
        }
        if self.llm.model.trim().is_empty() {
            return Err(ConfigLoadError::Invalid("llm.model must not be empty".into()));
        }
        if self.llm.timeout_secs == 0 {
            return Err(ConfigLoadError::Invalid(
                "llm.timeout_secs must be greater than zero".into(),
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for user in &self.users {
            if user.token.trim().is_empty() {
                return Err(ConfigLoadError::Invalid(format!(
                    "user '{}' has an empty token",
                    user.username
                )));
            }
            if !seen.insert(user.token.as_str()) {
                return Err(ConfigLoadError::Invalid(format!(
                    "user '{}' reuses a token already assigned to another user",
                    user.username
                )));
            }
        }
        Ok(())
    }

    /// Render the effective configuration as YAML with secrets masked.
    pub fn to_redacted_yaml(&self) -> Result<String, ConfigLoadError> {
        let mut copy = self.clone();
        if !copy.llm.api_key.is_empty() {
            copy.llm.api_key = REDACTED.into();
        }
        for user in &mut copy.users {
            user.token = REDACTED.into();
        }
        serde_yaml::to_string(&copy).map_err(|e| ConfigLoadError::Shape(e.to_string()))
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
pub struct QuillConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    files: Vec<File<config::FileSourceFile, FileFormat>>,
    inline: Vec<String>,
}

impl Default for QuillConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl QuillConfigLoader {
    /// Start with an empty builder; environment overrides are attached last in [`load`](Self::load).
    ///
    /// ```
    /// use quill_config::QuillConfigLoader;
    ///
    /// let config = QuillConfigLoader::new()
    ///     .with_yaml_str("llm:\n  api_key: sk-test\n")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.llm.api_key, "sk-test");
    /// assert_eq!(config.llm.endpoint, "https://api.openai.com/v1");
    /// assert!(config.users.is_empty());
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
            files: Vec::new(),
            inline: Vec::new(),
        }
    }

    /// Attach a YAML file that must exist.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.files
            .push(File::new(&path.as_ref().to_string_lossy(), FileFormat::Yaml).required(true));
        self
    }

    /// Attach a YAML file that may be absent (headless deployments rely on env only).
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.files
            .push(File::new(&path.as_ref().to_string_lossy(), FileFormat::Yaml).required(false));
        self
    }

    /// Merge an inline YAML snippet on top of any files.
    ///
    /// ```
    /// use quill_config::QuillConfigLoader;
    ///
    /// let cfg = QuillConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// llm:
    ///   api_key: "sk-test"
    /// users:
    ///   - username: "alice"
    ///     token: "alice-token"
    ///     is_staff: true
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.users.len(), 1);
    /// assert!(cfg.users[0].is_staff);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.inline.push(yaml.to_string());
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly typed config.
    ///
    /// `${VAR}` placeholders are expanded after the merge:
    ///
    /// ```
    /// use quill_config::QuillConfigLoader;
    ///
    /// unsafe { std::env::set_var("QUILL_DOC_API_KEY", "injected-from-env"); }
    ///
    /// let config = QuillConfigLoader::new()
    ///     .with_yaml_str("llm:\n  api_key: \"${QUILL_DOC_API_KEY}\"\n  model: gpt-4o-mini\n")
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.llm.api_key, "injected-from-env");
    /// assert_eq!(config.llm.model, "gpt-4o-mini");
    ///
    /// unsafe { std::env::remove_var("QUILL_DOC_API_KEY"); }
    /// ```
    pub fn load(self) -> Result<QuillConfig, ConfigLoadError> {
        let mut builder = self.builder;
        for file in self.files {
            builder = builder.add_source(file);
        }
        for yaml in &self.inline {
            builder = builder.add_source(File::from_str(yaml, FileFormat::Yaml));
        }
        builder = builder.add_source(
            Environment::with_prefix("QUILL")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;

        let mut v: Value = cfg.try_deserialize()?;
        // An entirely empty source set may deserialize to unit; normalise to an object.
        if v.is_null() {
            v = Value::Object(Default::default());
        }
        expand_env_in_value(&mut v);

        serde_json::from_value(v).map_err(|e| ConfigLoadError::Shape(e.to_string()))
    }
}
