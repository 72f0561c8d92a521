use crate::ai::tokens::Encoding;
use crate::error::AgentError;

/// Static description of a model served by the Argo gateway.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelSpec {
    pub name: &'static str,
    /// Upper bound for the response length accepted by the gateway.
    pub max_output_tokens: usize,
    /// Prompt plus response must fit in this many tokens.
    pub context_window: usize,
    /// Whether temperature/top_p/max_tokens are accepted.
    pub supports_standard_params: bool,
    pub encoding: Encoding,
    pub note: Option<&'static str>,
}

pub const DEFAULT_MODEL: &str = "gpt4olatest";

pub const MODELS: &[ModelSpec] = &[
    ModelSpec {
        name: "gpt35",
        max_output_tokens: 4096,
        context_window: 16385,
        supports_standard_params: true,
        encoding: Encoding::Cl100k,
        note: None,
    },
    ModelSpec {
        name: "gpt35large",
        max_output_tokens: 16384,
        context_window: 16385,
        supports_standard_params: true,
        encoding: Encoding::Cl100k,
        note: None,
    },
    ModelSpec {
        name: "gpt4",
        max_output_tokens: 8192,
        context_window: 8192,
        supports_standard_params: true,
        encoding: Encoding::Cl100k,
        note: None,
    },
    ModelSpec {
        name: "gpt4large",
        max_output_tokens: 32768,
        context_window: 32768,
        supports_standard_params: true,
        encoding: Encoding::Cl100k,
        note: None,
    },
    ModelSpec {
        name: "gpt4turbo",
        max_output_tokens: 4096,
        context_window: 128_000,
        supports_standard_params: true,
        encoding: Encoding::Cl100k,
        note: Some("Responds much slower than GPT-3.5"),
    },
    ModelSpec {
        name: "gpt4o",
        max_output_tokens: 16384,
        context_window: 128_000,
        supports_standard_params: true,
        encoding: Encoding::O200k,
        note: None,
    },
    ModelSpec {
        name: "gpt4olatest",
        max_output_tokens: 16384,
        context_window: 128_000,
        supports_standard_params: true,
        encoding: Encoding::O200k,
        note: None,
    },
    ModelSpec {
        name: "gpto1preview",
        max_output_tokens: 16384,
        context_window: 128_000,
        supports_standard_params: false,
        encoding: Encoding::O200k,
        note: Some("Only uses the user prompt and max_completion_tokens"),
    },
    ModelSpec {
        name: "gpto1mini",
        max_output_tokens: 65536,
        context_window: 128_000,
        supports_standard_params: false,
        encoding: Encoding::O200k,
        note: Some("Only available in the dev environment"),
    },
    ModelSpec {
        name: "gpto3mini",
        max_output_tokens: 100_000,
        context_window: 200_000,
        supports_standard_params: false,
        encoding: Encoding::O200k,
        note: Some("Only available in the dev environment"),
    },
    ModelSpec {
        name: "gpto1",
        max_output_tokens: 100_000,
        context_window: 200_000,
        supports_standard_params: false,
        encoding: Encoding::O200k,
        note: None,
    },
];

pub fn find(name: &str) -> Option<&'static ModelSpec> {
    MODELS.iter().find(|m| m.name == name)
}

/// Like [`find`] but reports the list of valid names on a miss.
pub fn lookup(name: &str) -> Result<&'static ModelSpec, AgentError> {
    find(name).ok_or_else(|| AgentError::UnknownModel {
        name: name.to_string(),
        valid: MODELS
            .iter()
            .map(|m| m.name)
            .collect::<Vec<_>>()
            .join(", "),
    })
}

impl ModelSpec {
    /// Response tokens actually requested once the model cap is applied.
    pub fn effective_max_tokens(&self, requested: usize) -> usize {
        requested.min(self.max_output_tokens)
    }
}
