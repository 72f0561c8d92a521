use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use log::info;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::ai::argo_client::{ApiResponse, ArgoChatRequest};

#[derive(Debug, Serialize)]
struct InteractionRecord<'a> {
    timestamp: String,
    request: RecordedRequest<'a>,
    response: RecordedResponse<'a>,
}

#[derive(Debug, Serialize)]
struct RecordedRequest<'a> {
    prompt: &'a str,
    model: &'a str,
    parameters: RecordedParameters,
    system: &'a str,
}

#[derive(Debug, Serialize)]
struct RecordedParameters {
    temperature: Option<f32>,
    top_p: Option<f32>,
    max_tokens: Option<usize>,
    max_completion_tokens: Option<usize>,
}

#[derive(Debug, Serialize)]
struct RecordedResponse<'a> {
    content: &'a str,
    time_taken: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    usage: Option<&'a serde_json::Value>,
}

/// Writes one JSON file per request/response pair.
pub struct InteractionLog {
    dir: PathBuf,
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

impl InteractionLog {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    /// `<dir>/<user>_<model>_<YYYYmmdd_HHMMSS>.json`; returns the written path.
    pub fn record(&self, request: &ArgoChatRequest, response: &ApiResponse) -> Result<PathBuf> {
        self.record_at(request, response, Local::now())
    }

    fn record_at(
        &self,
        request: &ArgoChatRequest,
        response: &ApiResponse,
        now: DateTime<Local>,
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        let file_name = format!(
            "{}_{}_{}.json",
            sanitize(&request.user),
            sanitize(&request.model),
            now.format("%Y%m%d_%H%M%S")
        );
        let path = self.dir.join(file_name);

        let record = InteractionRecord {
            timestamp: now.to_rfc3339(),
            request: RecordedRequest {
                prompt: request.prompt.first().map(String::as_str).unwrap_or_default(),
                model: &request.model,
                parameters: RecordedParameters {
                    temperature: request.temperature,
                    top_p: request.top_p,
                    max_tokens: request.max_tokens,
                    max_completion_tokens: request.max_completion_tokens,
                },
                system: &request.system,
            },
            response: RecordedResponse {
                content: &response.content,
                time_taken: response.elapsed.as_secs_f64(),
                usage: response.usage.as_ref(),
            },
        };

        let json = serde_json::to_string_pretty(&record)?;
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Interaction saved to: {}", path.display());

        Ok(path)
    }
}
