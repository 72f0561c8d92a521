use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Settings;

#[derive(Parser)]
#[command(name = "argoagent")]
#[command(about = "Send a prompt, optionally with file context, to the Argo API")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
#[command(after_help = "Put the prompt before --context, which takes one or more values:\n  argoagent \"summarize these notes\" -c notes/ report.pdf")]
pub struct Cli {
    /// The prompt to send to the model
    pub prompt: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Read the prompt from a file (any supported context format)
    #[arg(short = 'p', long, conflicts_with = "prompt")]
    pub prompt_file: Option<PathBuf>,

    /// Files, directories or glob patterns to include as context
    #[arg(short, long, num_args = 1..)]
    pub context: Vec<String>,

    /// Named system prompt (see `argoagent prompts`)
    #[arg(short, long)]
    pub system: Option<String>,

    /// Named task supplying a system prompt and prompt template (see `argoagent tasks`)
    #[arg(short = 'T', long)]
    pub task: Option<String>,

    /// Argo API endpoint URL
    #[arg(short, long, env = "ARGO_URL")]
    pub url: Option<String>,

    /// User name sent with the request
    #[arg(short = 'a', long, env = "ARGO_USER")]
    pub user: Option<String>,

    /// Model to use (see `argoagent models`)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Sampling temperature (0-2); ignored by models without standard parameters
    #[arg(short, long)]
    pub temperature: Option<f32>,

    /// Top-p sampling (0-1); ignored by models without standard parameters
    #[arg(short = 'o', long)]
    pub top_p: Option<f32>,

    /// Maximum response tokens, capped at the model limit
    #[arg(short = 'x', long)]
    pub max_tokens: Option<usize>,

    /// Only count the prompt tokens; no request is sent
    #[arg(short = 'n', long)]
    pub count_tokens: bool,

    /// Cut context to fit the token budget instead of failing
    #[arg(long)]
    pub truncate: bool,

    /// Do not save the request/response pair
    #[arg(long)]
    pub no_record: bool,

    /// Settings file to use instead of ~/.argoagent/config.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Create the settings file and the prompt, task and interaction directories
    Init,
    /// Show the effective configuration
    Config,
    /// List supported models and their limits
    Models,
    /// List available system prompts
    Prompts,
    /// List available tasks
    Tasks,
    /// Show version information
    Version,
}

/// Per-invocation request, separate from persisted settings.
#[derive(Debug, Clone, Default)]
pub struct PromptOptions {
    pub prompt: Option<String>,
    pub prompt_file: Option<PathBuf>,
    pub context: Vec<String>,
    pub system: Option<String>,
    pub task: Option<String>,
    pub count_only: bool,
}

impl From<&Cli> for PromptOptions {
    fn from(cli: &Cli) -> Self {
        Self {
            prompt: cli.prompt.clone(),
            prompt_file: cli.prompt_file.clone(),
            context: cli.context.clone(),
            system: cli.system.clone(),
            task: cli.task.clone(),
            count_only: cli.count_tokens,
        }
    }
}

/// Flag values that override the settings file when present.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub url: Option<String>,
    pub user: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub max_tokens: Option<usize>,
    pub truncate: Option<bool>,
    pub record_interactions: Option<bool>,
}

impl From<&Cli> for CliOverrides {
    fn from(cli: &Cli) -> Self {
        Self {
            url: cli.url.clone(),
            user: cli.user.clone(),
            model: cli.model.clone(),
            temperature: cli.temperature,
            top_p: cli.top_p,
            max_tokens: cli.max_tokens,
            truncate: cli.truncate.then_some(true),
            record_interactions: cli.no_record.then_some(false),
        }
    }
}

pub fn merge_cli_with_settings(mut base: Settings, cli: CliOverrides) -> Settings {
    if let Some(url) = cli.url {
        base.api.url = Some(url);
    }
    if let Some(user) = cli.user {
        base.api.user = Some(user);
    }
    if let Some(model) = cli.model {
        base.model.name = model;
    }
    if let Some(temperature) = cli.temperature {
        base.model.temperature = temperature;
    }
    if let Some(top_p) = cli.top_p {
        base.model.top_p = top_p;
    }
    if let Some(max_tokens) = cli.max_tokens {
        base.model.max_tokens = max_tokens;
    }
    if let Some(truncate) = cli.truncate {
        base.context.truncate = truncate;
    }
    if let Some(record) = cli.record_interactions {
        base.storage.record_interactions = record;
    }

    base
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_settings() {
        let mut base = Settings::default();
        base.api.url = Some("https://from-file".to_string());

        let cli = Cli::parse_from([
            "argoagent",
            "explain",
            "-u",
            "https://from-flag",
            "-m",
            "gpt4",
            "-x",
            "256",
            "--truncate",
            "--no-record",
        ]);
        let merged = merge_cli_with_settings(base, CliOverrides::from(&cli));

        assert_eq!(merged.api.url.as_deref(), Some("https://from-flag"));
        assert_eq!(merged.model.name, "gpt4");
        assert_eq!(merged.model.max_tokens, 256);
        assert!(merged.context.truncate);
        assert!(!merged.storage.record_interactions);
    }

    #[test]
    fn context_takes_several_values() {
        let cli = Cli::parse_from(["argoagent", "summarize", "-c", "a.txt", "docs/", "*.md", "-n"]);
        let options = PromptOptions::from(&cli);
        assert_eq!(options.prompt.as_deref(), Some("summarize"));
        assert_eq!(options.context, vec!["a.txt", "docs/", "*.md"]);
        assert!(options.count_only);
    }

    #[test]
    fn prompt_and_prompt_file_conflict() {
        let result = Cli::try_parse_from(["argoagent", "hi", "-p", "prompt.txt"]);
        assert!(result.is_err());
    }

    #[test]
    fn subcommands_parse() {
        let cli = Cli::parse_from(["argoagent", "models"]);
        assert_eq!(cli.command, Some(Commands::Models));
        assert!(cli.prompt.is_none());
    }
}
