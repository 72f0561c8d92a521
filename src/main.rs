use anyhow::Result;
use clap::Parser;
use log::error;

use argoagent::cli::{merge_cli_with_settings, CliOverrides, OutputFormatter, PromptOptions};
use argoagent::{Cli, CommandHandler, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Warnings by default, everything with -v; RUST_LOG still wins.
    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .parse_default_env()
        .init();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Settings::default_config_path()?,
    };
    let settings = match Settings::load_from(&config_path) {
        Ok(settings) => merge_cli_with_settings(settings, CliOverrides::from(&cli)),
        Err(e) => {
            error!("Failed to load settings: {e:#}");
            eprintln!("{}", OutputFormatter::default().format_error(&format!("{e:#}")));
            std::process::exit(1);
        }
    };

    let handler = CommandHandler::new(settings, config_path);

    let options = PromptOptions::from(&cli);
    let outcome = match cli.command {
        Some(command) => handler.handle_command(command).await,
        None => handler.handle_prompt(options).await,
    };

    match outcome {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
        }
        Err(e) => {
            error!("Command failed: {e:#}");
            eprintln!("{}", handler.format_error(&format!("{e:#}")));
            std::process::exit(1);
        }
    }

    Ok(())
}
