use crate::theme::{Color, ColorWrapper, StyleKind, Styler};
use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub ai: AIConfig,
    #[serde(default)]
    pub forum: ForumConfig,
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AIConfig {
    pub provider: AIProvider,
    pub model: String,
    pub max_tokens: u32,
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    /// Base URL of the completion API; the provider's public endpoint when
    /// unset.
    #[serde(default)]
    pub api_url: Option<String>,
}

impl Default for AIConfig {
    fn default() -> Self {
        Self {
            provider: AIProvider::Anthropic,
            model: "claude-3-haiku-20240307".to_string(),
            max_tokens: 1000,
            anthropic_api_key: None,
            openai_api_key: None,
            api_url: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum AIProvider {
    Anthropic,
    OpenAI,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ForumConfig {
    /// Origin of the course site, e.g. `https://codeinplace.stanford.edu`.
    pub origin: String,
    pub course_path: String,
    /// Only posts in this forum are linked from error messages.
    pub main_forum_id: String,
}

impl Default for ForumConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:3000".to_string(),
            course_path: "cip3".to_string(),
            main_forum_id: "main".to_string(),
        }
    }
}

impl ForumConfig {
    pub fn forum_url(&self) -> String {
        format!(
            "{}/{}/forum",
            self.origin.trim_end_matches('/'),
            self.course_path.trim_matches('/')
        )
    }

    pub fn post_url(&self, post_id: &str) -> String {
        format!("{}?post={}", self.forum_url(), post_id)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AnalyzerConfig {
    /// Syntax checker reading the program on stdin.
    pub program: String,
    pub args: Vec<String>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            program: "python3".to_string(),
            args: vec!["-m".to_string(), "pyflakes".to_string()],
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DisplayConfig {
    pub color: ColorWrapper,
    pub style: StyleKind,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            color: ColorWrapper(Color::Yellow),
            style: StyleKind::Ansi,
        }
    }
}

impl DisplayConfig {
    pub fn styler(&self) -> Box<dyn Styler> {
        self.style.styler(self.color.0)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct StoreConfig {
    /// JSON document store; defaults to `store.json` in the data directory.
    pub path: Option<PathBuf>,
}

impl Config {
    pub fn create_default(path: &Path) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.apply_env();
        Ok(config)
    }

    /// Load the config file, writing the defaults first if it is missing.
    pub fn ensure_config_exists() -> Result<Self> {
        let config_path = get_config_path()?;

        if !config_path.exists() {
            tracing::info!("creating default config at {:?}", config_path);
            Self::create_default(&config_path)?;
        }

        Self::load(&config_path)
    }

    /// API keys from the environment win over the file.
    fn apply_env(&mut self) {
        if let Ok(key) = env::var("ANTHROPIC_API_KEY") {
            self.ai.anthropic_api_key = Some(key);
        }
        if let Ok(key) = env::var("OPENAI_API_KEY") {
            self.ai.openai_api_key = Some(key);
        }
    }

    pub fn store_path(&self) -> Result<PathBuf> {
        match &self.store.path {
            Some(path) => Ok(path.clone()),
            None => Ok(project_dirs()?.data_dir().join("store.json")),
        }
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "errorhint", "errorhint")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
}

pub fn get_config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join("config.toml"))
}
