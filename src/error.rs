use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced by the context pipeline and the API client.
///
/// `ContextNotFound` and `ExtractionFailed` are collected and reported while the run
/// continues; every other variant aborts the current invocation.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("no files found for context '{0}'")]
    ContextNotFound(String),

    #[error("could not extract text from {}: {reason}", path.display())]
    ExtractionFailed { path: PathBuf, reason: String },

    #[error(
        "prompt needs {actual} tokens but only {allowed} are available; narrow the context or lower --max-tokens"
    )]
    ContextTooLarge { actual: usize, allowed: usize },

    #[error("{0}")]
    AmbiguousPromptSource(String),

    #[error("API request failed: {0}")]
    ApiRequestFailed(String),

    #[error("invalid model name: {name}. Valid models are: {valid}")]
    UnknownModel { name: String, valid: String },

    #[error("unknown system prompt '{0}' (see `argoagent prompts`)")]
    UnknownSystemPrompt(String),

    #[error("unknown task '{0}' (see `argoagent tasks`)")]
    UnknownTask(String),

    #[error("{0}")]
    InvalidParameter(String),

    #[error("{0}")]
    Configuration(String),
}
