pub mod argo_client;
pub mod models;
pub mod prompt;
pub mod tokens;
pub mod transcript;

pub use argo_client::{ApiResponse, ArgoChatRequest, ArgoClient};
pub use models::ModelSpec;
pub use prompt::{
    ModelParameters, PromptAssembler, PromptPayload, PromptSource, ResolvedPrompt,
    TruncationPolicy,
};
pub use tokens::{count_tokens, Encoding, TokenCounter};
pub use transcript::InteractionLog;
