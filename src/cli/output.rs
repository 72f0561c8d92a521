use console::{style, Color};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::ai::{ModelSpec, PromptPayload, TokenCounter};
use crate::config::{PromptLibrary, TaskDefinition};
use crate::context::ContextData;

const PROMPT_PREVIEW_CHARS: usize = 100;

/// What the response header shows besides the model output.
pub struct ResponseView<'a> {
    pub model: &'a str,
    pub label: Option<&'a str>,
    pub token_count: usize,
    pub prompt: &'a str,
    pub content: &'a str,
}

pub struct OutputFormatter {
    use_colors: bool,
}

pub struct Spinner {
    bar: ProgressBar,
}

impl Spinner {
    pub fn new(message: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", ""]),
        );
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    pub fn stop(self) {
        self.bar.finish_and_clear();
    }
}

fn preview(text: &str) -> String {
    let single_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() > PROMPT_PREVIEW_CHARS {
        let cut: String = single_line.chars().take(PROMPT_PREVIEW_CHARS).collect();
        format!("{cut}...")
    } else {
        single_line
    }
}

impl OutputFormatter {
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    pub fn format_response(&self, view: &ResponseView<'_>) -> String {
        let mut header = vec![format!(
            "{} {}",
            self.style_text("Model:", Color::Blue),
            self.style_text(view.model, Color::Green)
        )];
        if let Some(label) = view.label {
            header.push(format!(
                "{} {}",
                self.style_text("System Prompt:", Color::Blue),
                self.style_text(label, Color::Magenta)
            ));
        }
        header.push(format!(
            "{} {}",
            self.style_text("Tokens:", Color::Blue),
            self.style_text(&view.token_count.to_string(), Color::Cyan)
        ));
        header.push(format!(
            "{} {}",
            self.style_text("Prompt:", Color::Blue),
            self.style_text(&preview(view.prompt), Color::Yellow)
        ));

        let rule = self.style_text(&"─".repeat(60), Color::Blue);
        format!(
            "{rule}\n{}\n{rule}\n\n{}",
            header.join("\n"),
            view.content.trim_end()
        )
    }

    /// Per-document and total token counts for `--count-tokens`.
    pub fn format_token_report(&self, payload: &PromptPayload, context: &ContextData) -> String {
        let counter = TokenCounter::for_model(&payload.model_parameters.model);
        let mut lines = Vec::new();

        for document in &context.documents {
            let path = document.source_path.display().to_string();
            match &document.extraction_error {
                None => lines.push(format!(
                    "  {:>8}  {}",
                    counter.count(&document.text_content),
                    path
                )),
                Some(reason) => lines.push(format!(
                    "  {:>8}  {} {}",
                    "-",
                    path,
                    self.style_text(&format!("({reason})"), Color::Red)
                )),
            }
        }

        let mut report = String::new();
        if !lines.is_empty() {
            report.push_str(&self.style_text("Context files:", Color::Cyan));
            report.push('\n');
            report.push_str(&lines.join("\n"));
            report.push_str("\n\n");
        }
        report.push_str(&format!(
            "Prompt contains {} tokens (budget {} for model {}, {} reserved for the response)",
            self.style_text(&payload.token_count.to_string(), Color::Green),
            payload.token_budget,
            payload.model_parameters.model,
            payload.model_parameters.max_tokens
        ));
        if payload.truncated {
            report.push('\n');
            report.push_str(&self.format_warning(&format!(
                "Context was truncated; {} file(s) included",
                payload.included.len()
            )));
        }
        report
    }

    pub fn format_models(&self, models: &[ModelSpec], current: &str) -> String {
        let mut output = String::from("Available models:\n");
        for model in models {
            let marker = if model.name == current { "*" } else { " " };
            output.push_str(&format!(
                "\n{marker} {}\n    max response tokens: {}\n    context window: {}\n    temperature/top_p: {}\n",
                self.style_text(model.name, Color::Green),
                model.max_output_tokens,
                model.context_window,
                if model.supports_standard_params { "yes" } else { "no" }
            ));
            if let Some(note) = model.note {
                output.push_str(&format!("    note: {note}\n"));
            }
        }
        output
    }

    pub fn format_prompts(&self, library: &PromptLibrary) -> String {
        let names: Vec<String> = library
            .prompt_names()
            .map(|name| format!("- {}", self.style_text(name, Color::Green)))
            .collect();
        format!("System prompts:\n{}", names.join("\n"))
    }

    pub fn format_tasks<'a>(
        &self,
        tasks: impl Iterator<Item = (&'a str, &'a TaskDefinition)>,
    ) -> String {
        let lines: Vec<String> = tasks
            .map(|(key, task)| {
                if task.description.is_empty() {
                    format!("- {}", self.style_text(key, Color::Green))
                } else {
                    format!("- {}: {}", self.style_text(key, Color::Green), task.description)
                }
            })
            .collect();
        if lines.is_empty() {
            self.format_info("No tasks found")
        } else {
            format!("Tasks:\n{}", lines.join("\n"))
        }
    }

    pub fn format_error(&self, message: &str) -> String {
        format!("{} {}", self.style_text("Error:", Color::Red), message)
    }

    pub fn format_success(&self, message: &str) -> String {
        format!("{} {}", self.style_text("✓", Color::Green), message)
    }

    pub fn format_warning(&self, message: &str) -> String {
        format!("{} {}", self.style_text("⚠", Color::Yellow), message)
    }

    pub fn format_info(&self, message: &str) -> String {
        format!("{} {}", self.style_text("ℹ", Color::Blue), message)
    }

    fn style_text(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            style(text).fg(color).to_string()
        } else {
            text.to_string()
        }
    }
}

impl Default for OutputFormatter {
    fn default() -> Self {
        Self::new(true)
    }
}
