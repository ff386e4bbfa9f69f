use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub agent: AgentConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KnowledgeConfig {
    /// `filesystem` walks `root`; `bundle` reads a prebuilt JSON asset.
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default = "default_root")]
    pub root: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
    #[serde(default)]
    pub bundle_path: Option<PathBuf>,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            root: default_root(),
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
            follow_symlinks: false,
            bundle_path: None,
        }
    }
}

fn default_source() -> String {
    "filesystem".to_string()
}
fn default_root() -> PathBuf {
    PathBuf::from("./assets/algoritmos")
}
fn default_include_globs() -> Vec<String> {
    vec!["**/*.yaml".to_string(), "**/*.yml".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct ContextConfig {
    /// Used when neither the request nor the pet carries a language tag.
    #[serde(default)]
    pub default_lang: Option<String>,
    #[serde(default = "default_user_level")]
    pub user_level: String,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            default_lang: None,
            user_level: default_user_level(),
        }
    }
}

fn default_user_level() -> String {
    "familiar".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_true")]
    pub warm_on_start: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            warm_on_start: true,
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:3001".to_string()
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct AgentConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default)]
    pub system_prompt_path: Option<PathBuf>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub temperature: Option<f32>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            system_prompt_path: None,
            timeout_secs: default_timeout_secs(),
            temperature: None,
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}
fn default_timeout_secs() -> u64 {
    60
}

impl AgentConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

impl Config {
    /// Defaults only, for commands that can run without a config file.
    pub fn minimal() -> Self {
        Self::default()
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    match config.knowledge.source.as_str() {
        "filesystem" => {}
        "bundle" => {
            if config.knowledge.bundle_path.is_none() {
                anyhow::bail!("knowledge.bundle_path must be set when source is 'bundle'");
            }
        }
        other => anyhow::bail!(
            "Unknown knowledge source: '{}'. Must be filesystem or bundle.",
            other
        ),
    }

    if config.context.user_level.trim().is_empty() {
        anyhow::bail!("context.user_level must not be empty");
    }

    match config.agent.provider.as_str() {
        "disabled" | "openai" => {}
        other => anyhow::bail!(
            "Unknown agent provider: '{}'. Must be disabled or openai.",
            other
        ),
    }

    if config.agent.timeout_secs == 0 {
        anyhow::bail!("agent.timeout_secs must be > 0");
    }

    Ok(())
}
