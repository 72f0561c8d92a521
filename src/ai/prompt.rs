use log::{debug, warn};
use serde::Serialize;
use std::path::PathBuf;

use crate::ai::tokens::TokenCounter;
use crate::config::PromptLibrary;
use crate::context::ExtractedDocument;
use crate::error::AgentError;

pub const CONTEXT_PLACEHOLDER: &str = "{context}";
pub const GOAL_PLACEHOLDER: &str = "{goal}";
const TRUNCATION_MARKER: &str = "[... truncated ...]";
const CONTEXT_INTRO: &str = "\n\nReply based on the following context:\n\n";
const BLOCK_SEPARATOR: &str = "\n\n";
// Re-selection rounds when joined blocks tokenize longer than their separate counts.
const MAX_FIT_ROUNDS: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelParameters {
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    /// Tokens reserved for the response.
    pub max_tokens: usize,
}

/// What happens when the assembled prompt does not fit the budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TruncationPolicy {
    #[default]
    Reject,
    /// Keep whole documents while they fit, cut the first one that does not, drop the rest.
    TruncateContext,
}

/// Where the system prompt comes from. A named prompt and a task are exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptSource {
    Default,
    System(String),
    Task(String),
}

impl PromptSource {
    /// Validates the combination of flags before any file or network work happens.
    pub fn select(
        system: Option<&str>,
        task: Option<&str>,
        has_user_prompt: bool,
    ) -> Result<Self, AgentError> {
        match (system, task) {
            (Some(system), Some(task)) => Err(AgentError::AmbiguousPromptSource(format!(
                "system prompt '{system}' and task '{task}' cannot be combined; a task already selects its own system prompt"
            ))),
            (Some(system), None) if has_user_prompt => Ok(PromptSource::System(system.to_string())),
            (None, Some(task)) => Ok(PromptSource::Task(task.to_string())),
            (None, None) if has_user_prompt => Ok(PromptSource::Default),
            _ => Err(AgentError::AmbiguousPromptSource(
                "no prompt given; pass a prompt, --prompt-file or --task".to_string(),
            )),
        }
    }

    /// Looks the source up in the library and settles the user prompt. An explicit
    /// user prompt always wins over a task template.
    ///
    /// `default_system` stands in whenever no named prompt applies, so the resolved
    /// system prompt is exactly the one that gets sent and counted.
    pub fn resolve(
        &self,
        library: &PromptLibrary,
        user_prompt: Option<String>,
        default_system: &str,
    ) -> Result<ResolvedPrompt, AgentError> {
        let fallback = || (!default_system.trim().is_empty()).then(|| default_system.to_string());
        match self {
            PromptSource::Default => Ok(ResolvedPrompt {
                system_prompt: fallback(),
                user_prompt: user_prompt.unwrap_or_default(),
                label: None,
            }),
            PromptSource::System(name) => {
                let text = library
                    .system_prompt(name)
                    .ok_or_else(|| AgentError::UnknownSystemPrompt(name.clone()))?;
                Ok(ResolvedPrompt {
                    system_prompt: Some(text.to_string()),
                    user_prompt: user_prompt.unwrap_or_default(),
                    label: Some(name.clone()),
                })
            }
            PromptSource::Task(name) => {
                let task = library
                    .task(name)
                    .ok_or_else(|| AgentError::UnknownTask(name.clone()))?;
                let template = user_prompt.unwrap_or_else(|| task.user_prompt.clone());
                if template.trim().is_empty() {
                    return Err(AgentError::AmbiguousPromptSource(format!(
                        "task '{name}' has no user prompt template; pass a prompt"
                    )));
                }
                Ok(ResolvedPrompt {
                    system_prompt: library
                        .task_system_prompt(task)
                        .map(str::to_string)
                        .or_else(fallback),
                    user_prompt: template.replace(GOAL_PLACEHOLDER, &task.goal),
                    label: Some(format!("task:{name}")),
                })
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPrompt {
    pub system_prompt: Option<String>,
    pub user_prompt: String,
    /// Prompt or task name shown in the response header.
    pub label: Option<String>,
}

/// The outbound request, fixed once assembled.
#[derive(Debug, Clone, Serialize)]
pub struct PromptPayload {
    pub system_prompt: Option<String>,
    pub user_prompt: String,
    /// Rendered context blocks in resolution order.
    pub context_text: String,
    /// User prompt with the context embedded; this is what gets sent.
    pub message: String,
    pub model_parameters: ModelParameters,
    pub token_count: usize,
    pub token_budget: usize,
    pub included: Vec<PathBuf>,
    pub truncated: bool,
}

fn render_block(document: &ExtractedDocument, text: &str) -> String {
    let path = document.source_path.display();
    format!("--- BEGIN FILE: {path} ---\n{text}\n--- END FILE: {path} ---")
}

fn compose_message(user_prompt: &str, context: &str) -> String {
    if user_prompt.contains(CONTEXT_PLACEHOLDER) {
        user_prompt.replace(CONTEXT_PLACEHOLDER, context)
    } else if context.is_empty() {
        user_prompt.to_string()
    } else {
        format!("{user_prompt}{CONTEXT_INTRO}{context}")
    }
}

pub struct PromptAssembler {
    context_window: usize,
    policy: TruncationPolicy,
}

impl PromptAssembler {
    /// `context_window` covers prompt and response; the response share is taken from
    /// `ModelParameters::max_tokens` at assembly time.
    pub fn new(context_window: usize) -> Self {
        Self {
            context_window,
            policy: TruncationPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: TruncationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Combines system prompt, user prompt and extracted documents into one payload.
    ///
    /// Documents that failed extraction are left out. The sum of the system prompt and
    /// message token counts must not exceed `context_window - max_tokens`.
    pub fn assemble(
        &self,
        user_prompt: &str,
        system_prompt: Option<&str>,
        documents: &[ExtractedDocument],
        parameters: ModelParameters,
    ) -> Result<PromptPayload, AgentError> {
        let counter = TokenCounter::for_model(&parameters.model);
        let allowed = self.context_window.saturating_sub(parameters.max_tokens);
        let system_tokens = system_prompt.map_or(0, |s| counter.count(s));
        let measure = |blocks: &[String]| {
            system_tokens + counter.count(&compose_message(user_prompt, &blocks.join(BLOCK_SEPARATOR)))
        };

        let usable: Vec<&ExtractedDocument> = documents
            .iter()
            .filter(|d| {
                if !d.is_ok() {
                    debug!("Leaving out {}", d.source_path.display());
                }
                d.is_ok()
            })
            .collect();

        let mut blocks: Vec<String> = usable
            .iter()
            .map(|d| render_block(d, &d.text_content))
            .collect();
        let mut included: Vec<PathBuf> = usable.iter().map(|d| d.source_path.clone()).collect();
        let mut truncated = false;
        let mut total = measure(&blocks);

        if total > allowed {
            if self.policy == TruncationPolicy::Reject {
                return Err(AgentError::ContextTooLarge {
                    actual: total,
                    allowed,
                });
            }

            let bare = measure(&[]);
            if bare > allowed {
                return Err(AgentError::ContextTooLarge {
                    actual: bare,
                    allowed,
                });
            }

            // Each block is tokenized once; selection then works on a running total.
            let block_tokens: Vec<usize> = blocks.iter().map(|b| counter.count(b)).collect();
            let intro = if user_prompt.contains(CONTEXT_PLACEHOLDER) {
                0
            } else {
                counter.count(CONTEXT_INTRO)
            };
            let frame = bare + intro;
            let separator = counter.count(BLOCK_SEPARATOR);

            let mut overshoot = 0;
            for _ in 0..MAX_FIT_ROUNDS {
                let room = allowed.saturating_sub(frame + overshoot);
                (blocks, included) =
                    select_within(&usable, &block_tokens, separator, room, &counter);
                total = measure(&blocks);
                if total <= allowed {
                    break;
                }
                overshoot += total - allowed;
            }

            if total > allowed {
                return Err(AgentError::ContextTooLarge {
                    actual: total,
                    allowed,
                });
            }
            truncated = true;
            warn!(
                "Context truncated to {} of {} documents to fit {allowed} tokens",
                included.len(),
                usable.len()
            );
        }

        let context_text = blocks.join(BLOCK_SEPARATOR);
        let message = compose_message(user_prompt, &context_text);
        debug!("Assembled prompt: {total} of {allowed} tokens");

        Ok(PromptPayload {
            system_prompt: system_prompt.map(str::to_string),
            user_prompt: user_prompt.to_string(),
            context_text,
            message,
            model_parameters: parameters,
            token_count: total,
            token_budget: allowed,
            included,
            truncated,
        })
    }
}

/// Whole documents in order while they fit in `room`, then the longest prefix of the
/// first one that does not.
fn select_within(
    documents: &[&ExtractedDocument],
    block_tokens: &[usize],
    separator: usize,
    mut room: usize,
    counter: &TokenCounter,
) -> (Vec<String>, Vec<PathBuf>) {
    let mut blocks = Vec::new();
    let mut included = Vec::new();

    for (document, &tokens) in documents.iter().zip(block_tokens) {
        let joint = if blocks.is_empty() { 0 } else { separator };
        if tokens + joint <= room {
            room -= tokens + joint;
            blocks.push(render_block(document, &document.text_content));
            included.push(document.source_path.clone());
            continue;
        }
        if let Some(partial) = fit_prefix(document, room.saturating_sub(joint), counter) {
            blocks.push(partial);
            included.push(document.source_path.clone());
        }
        break;
    }

    (blocks, included)
}

/// Longest character prefix of `document` whose marked block counts at most `room`.
fn fit_prefix(document: &ExtractedDocument, room: usize, counter: &TokenCounter) -> Option<String> {
    let text = &document.text_content;
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let partial = |chars: usize| {
        let cut = &text[..boundaries[chars]];
        render_block(document, &format!("{cut}\n{TRUNCATION_MARKER}"))
    };

    // Largest `chars` in 1..len that fits; the whole text already did not.
    let (mut lo, mut hi) = (0usize, boundaries.len() - 1);
    while lo + 1 < hi {
        let mid = (lo + hi) / 2;
        if counter.count(&partial(mid)) <= room {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    (lo > 0).then(|| partial(lo))
}
