pub mod ai;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod utils;

pub use ai::{PromptAssembler, PromptPayload, TokenCounter};
pub use cli::{Cli, CommandHandler, Commands};
pub use config::Settings;
pub use context::{ContextData, ContextManager, PathResolver};
pub use error::AgentError;
