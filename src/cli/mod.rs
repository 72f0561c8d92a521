pub mod args;
pub mod commands;
pub mod output;

pub use args::{merge_cli_with_settings, Cli, CliOverrides, Commands, PromptOptions};
pub use commands::CommandHandler;
pub use output::{OutputFormatter, Spinner};
