use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::ai::models::{self, MODELS};
use crate::ai::{
    ArgoClient, InteractionLog, ModelParameters, PromptAssembler, PromptSource, TruncationPolicy,
};
use crate::cli::output::ResponseView;
use crate::cli::{Commands, OutputFormatter, PromptOptions, Spinner};
use crate::config::{DefaultConfig, PromptLibrary, Settings};
use crate::context::{extract, ContextManager};
use crate::error::AgentError;
use crate::utils::ParameterValidator;

pub struct CommandHandler {
    settings: Settings,
    library: PromptLibrary,
    formatter: OutputFormatter,
    config_path: PathBuf,
}

impl CommandHandler {
    pub fn new(settings: Settings, config_path: PathBuf) -> Self {
        let library = PromptLibrary::load(&settings.storage.prompts_dir, &settings.storage.tasks_dir);
        let formatter = OutputFormatter::new(settings.output.use_colors);

        Self {
            settings,
            library,
            formatter,
            config_path,
        }
    }

    /// Runs one prompt end to end and returns the text to print.
    pub async fn handle_prompt(&self, options: PromptOptions) -> Result<String> {
        let has_user_prompt = options.prompt.is_some() || options.prompt_file.is_some();
        let source = PromptSource::select(
            options.system.as_deref(),
            options.task.as_deref(),
            has_user_prompt,
        )?;

        let model = models::lookup(&self.settings.model.name)?;
        let parameters = ModelParameters {
            model: model.name.to_string(),
            temperature: self.settings.model.temperature,
            top_p: self.settings.model.top_p,
            max_tokens: model.effective_max_tokens(self.settings.model.max_tokens),
        };
        ParameterValidator::new().validate(&parameters)?;
        if parameters.max_tokens < self.settings.model.max_tokens {
            warn!(
                "max_tokens {} exceeds the {} limit; using {}",
                self.settings.model.max_tokens, model.name, parameters.max_tokens
            );
        }

        // Configuration problems surface before any file is read.
        let client = if options.count_only {
            None
        } else {
            Some(self.build_client()?)
        };

        let user_prompt = match &options.prompt_file {
            Some(path) => {
                let document = extract(path);
                if let Some(reason) = document.extraction_error {
                    return Err(AgentError::ExtractionFailed {
                        path: path.clone(),
                        reason,
                    }
                    .into());
                }
                Some(document.text_content)
            }
            None => options.prompt.clone(),
        };
        let resolved = source.resolve(
            &self.library,
            user_prompt,
            &self.settings.api.default_system_prompt,
        )?;
        debug!("Prompt source: {source:?}");

        let context = ContextManager::new(&self.settings.context).gather(&options.context);
        for warning in &context.warnings {
            eprintln!("{}", self.formatter.format_warning(&warning.to_string()));
        }

        let policy = if self.settings.context.truncate {
            TruncationPolicy::TruncateContext
        } else {
            TruncationPolicy::Reject
        };
        let payload = PromptAssembler::new(model.context_window)
            .with_policy(policy)
            .assemble(
                &resolved.user_prompt,
                resolved.system_prompt.as_deref(),
                &context.documents,
                parameters,
            )?;

        let Some(client) = client else {
            return Ok(self.formatter.format_token_report(&payload, &context));
        };

        let request = client.build_request(&payload, model);
        let spinner = Spinner::new(&format!("Waiting for {}...", model.name));
        let result = client.generate(&request).await;
        spinner.stop();
        let response = result?;

        if self.settings.storage.record_interactions {
            let log = InteractionLog::new(&self.settings.storage.interactions_dir);
            if let Err(e) = log.record(&request, &response) {
                warn!("Failed to save interaction: {e:#}");
            }
        }

        Ok(self.formatter.format_response(&ResponseView {
            model: model.name,
            label: resolved.label.as_deref(),
            token_count: payload.token_count,
            prompt: &resolved.user_prompt,
            content: &response.content,
        }))
    }

    fn build_client(&self) -> Result<ArgoClient, AgentError> {
        let api = &self.settings.api;
        let url = api.url.as_deref().ok_or_else(|| {
            AgentError::Configuration(
                "no API URL configured; pass --url, set ARGO_URL or add [api] url to the settings file"
                    .to_string(),
            )
        })?;
        let user = api.user.as_deref().ok_or_else(|| {
            AgentError::Configuration(
                "no API user configured; pass --user, set ARGO_USER or add [api] user to the settings file"
                    .to_string(),
            )
        })?;

        ArgoClient::new(url, user, Duration::from_secs(api.timeout_secs))
    }

    pub async fn handle_command(&self, command: Commands) -> Result<String> {
        match command {
            Commands::Init => self.handle_init(),
            Commands::Config => self.handle_config(),
            Commands::Models => Ok(self
                .formatter
                .format_models(MODELS, &self.settings.model.name)),
            Commands::Prompts => Ok(self.formatter.format_prompts(&self.library)),
            Commands::Tasks => Ok(self.formatter.format_tasks(self.library.tasks())),
            Commands::Version => Ok(version_info()),
        }
    }

    fn handle_init(&self) -> Result<String> {
        info!("Initializing argoagent");
        let storage = &self.settings.storage;
        let mut messages = Vec::new();

        if self.config_path.exists() {
            messages.push(self.formatter.format_info(&format!(
                "Keeping existing settings file {}",
                self.config_path.display()
            )));
        } else {
            if let Some(parent) = self.config_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&self.config_path, DefaultConfig::create_default_config_file()?)
                .with_context(|| format!("Failed to write {}", self.config_path.display()))?;
            messages.push(self.formatter.format_success(&format!(
                "Created {}",
                self.config_path.display()
            )));
        }

        for dir in [
            &storage.prompts_dir,
            &storage.tasks_dir,
            &storage.interactions_dir,
        ] {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }

        let example = storage.tasks_dir.join("code_fixes.yaml");
        if !example.exists() {
            fs::write(&example, DefaultConfig::example_task())
                .with_context(|| format!("Failed to write {}", example.display()))?;
            messages.push(self.formatter.format_success(&format!(
                "Created example task {}",
                example.display()
            )));
        }

        messages.push(self.formatter.format_success("argoagent initialized"));
        Ok(messages.join("\n"))
    }

    fn handle_config(&self) -> Result<String> {
        let body = toml::to_string_pretty(&self.settings)?;
        Ok(format!(
            "Settings file: {}{}\n\n{body}",
            self.config_path.display(),
            if self.config_path.exists() {
                ""
            } else {
                " (not created yet, run `argoagent init`)"
            }
        ))
    }

    pub fn format_error(&self, message: &str) -> String {
        self.formatter.format_error(message)
    }
}

fn version_info() -> String {
    format!(
        "argoagent {}\nRust version: {}\nPlatform: {}-{}",
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_RUST_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}
