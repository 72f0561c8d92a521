use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::ai::models::DEFAULT_MODEL;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant.";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct Settings {
    pub api: ApiConfig,
    pub model: ModelConfig,
    pub context: ContextConfig,
    pub storage: StorageConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    pub timeout_secs: u64,
    pub default_system_prompt: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    pub name: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: usize,
}

/// Directory expansion policy for context specifiers.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ContextConfig {
    /// Recursion limit below a directory specifier; `None` walks the whole tree.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
    /// Include dot-files and descend into dot-directories.
    pub include_hidden: bool,
    /// Skip binary formats (images, archives, ...) while walking directories.
    pub skip_unsupported: bool,
    /// Cut context to fit the token budget instead of failing.
    pub truncate: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub prompts_dir: PathBuf,
    pub tasks_dir: PathBuf,
    pub interactions_dir: PathBuf,
    pub record_interactions: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub use_colors: bool,
}

impl Settings {
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            let settings: Settings = toml::from_str(&content)
                .with_context(|| format!("Invalid settings in {}", config_path.display()))?;
            Ok(settings)
        } else {
            // Return default settings if config doesn't exist
            Ok(Self::default())
        }
    }

    pub fn default_config_path() -> Result<PathBuf> {
        Ok(base_dir()?.join("config.toml"))
    }
}

/// `~/.argoagent`
pub fn base_dir() -> Result<PathBuf> {
    let home_dir =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
    Ok(home_dir.join(".argoagent"))
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: None,
            user: None,
            timeout_secs: 300,
            default_system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            top_p: 0.9,
            max_tokens: 4096,
        }
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            include_hidden: false,
            skip_unsupported: true,
            truncate: false,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let base = base_dir().unwrap_or_else(|_| PathBuf::from(".argoagent"));
        Self {
            prompts_dir: base.join("prompts"),
            tasks_dir: base.join("tasks"),
            interactions_dir: base.join("interactions"),
            record_interactions: true,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { use_colors: true }
    }
}
