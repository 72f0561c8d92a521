// External dependencies
use log::{debug, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use url::Url;

// Internal dependencies
use crate::ai::models::ModelSpec;
use crate::ai::prompt::PromptPayload;
use crate::error::AgentError;

// ============================================================================
// Argo API Structures
// ============================================================================

#[derive(Debug, Serialize, PartialEq)]
pub struct ArgoChatRequest {
    pub user: String,
    pub model: String,
    pub system: String,
    pub prompt: Vec<String>,
    pub stop: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_completion_tokens: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct ArgoChatResponse {
    response: String,
    #[serde(default)]
    usage: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub content: String,
    pub usage: Option<serde_json::Value>,
    pub elapsed: Duration,
}

pub struct ArgoClient {
    client: Client,
    endpoint: Url,
    user: String,
}

// ============================================================================
// Client Implementation
// ============================================================================

impl ArgoClient {
    pub fn new(
        endpoint: &str,
        user: &str,
        timeout: Duration,
    ) -> Result<Self, AgentError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| AgentError::Configuration(format!("Invalid API URL '{endpoint}': {e}")))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(AgentError::Configuration(format!(
                "API URL must use http or https, got '{}'",
                endpoint.scheme()
            )));
        }
        if user.trim().is_empty() {
            return Err(AgentError::Configuration("API user must not be empty".to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AgentError::Configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            user: user.to_string(),
        })
    }

    /// Builds the wire request from exactly what the assembler counted. Models without
    /// standard sampling parameters only get `max_completion_tokens`.
    pub fn build_request(&self, payload: &PromptPayload, model: &ModelSpec) -> ArgoChatRequest {
        let parameters = &payload.model_parameters;
        let max_tokens = model.effective_max_tokens(parameters.max_tokens);
        let standard = model.supports_standard_params;

        ArgoChatRequest {
            user: self.user.clone(),
            model: parameters.model.clone(),
            system: payload.system_prompt.clone().unwrap_or_default(),
            prompt: vec![payload.message.clone()],
            stop: Vec::new(),
            temperature: standard.then_some(parameters.temperature),
            top_p: standard.then_some(parameters.top_p),
            max_tokens: standard.then_some(max_tokens),
            max_completion_tokens: (!standard).then_some(max_tokens),
        }
    }

    /// Sends one request. No retries: any transport error, non-success status or
    /// unparseable body becomes `ApiRequestFailed`.
    pub async fn generate(
        &self,
        request: &ArgoChatRequest,
    ) -> Result<ApiResponse, AgentError> {
        debug!(
            "Sending request to {}, prompt length: {}",
            self.endpoint,
            request.prompt.iter().map(String::len).sum::<usize>()
        );
        let started = Instant::now();

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| AgentError::ApiRequestFailed(format!("could not reach {}: {e}", self.endpoint)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!("Error body: {body}");
            return Err(AgentError::ApiRequestFailed(format!(
                "server returned {status}{}",
                if body.is_empty() {
                    String::new()
                } else {
                    format!(": {}", body.chars().take(200).collect::<String>())
                }
            )));
        }

        let body: ArgoChatResponse = response
            .json()
            .await
            .map_err(|e| AgentError::ApiRequestFailed(format!("malformed response: {e}")))?;

        let elapsed = started.elapsed();
        info!("Response received in {:.2} seconds", elapsed.as_secs_f64());

        Ok(ApiResponse {
            content: body.response,
            usage: body.usage,
            elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::models;
    use crate::ai::prompt::{ModelParameters, PromptAssembler, PromptSource};
    use crate::ai::tokens::TokenCounter;
    use crate::config::settings::DEFAULT_SYSTEM_PROMPT;
    use crate::config::PromptLibrary;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    /// Serves exactly one HTTP response and hands back the request body it received.
    fn one_shot_server(status: &str, body: &str) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/api/chat", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            let body_start = loop {
                let n = stream.read(&mut buf).unwrap();
                raw.extend_from_slice(&buf[..n]);
                if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
            };
            let headers = String::from_utf8_lossy(&raw[..body_start]).to_ascii_lowercase();
            let length = headers
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            while raw.len() < body_start + length {
                let n = stream.read(&mut buf).unwrap();
                raw.extend_from_slice(&buf[..n]);
            }
            tx.send(String::from_utf8_lossy(&raw[body_start..]).to_string())
                .unwrap();
            stream.write_all(response.as_bytes()).unwrap();
        });

        (url, rx)
    }

    fn payload(model: &str, max_tokens: usize) -> PromptPayload {
        PromptAssembler::new(200_000)
            .assemble(
                "summarize",
                None,
                &[],
                ModelParameters {
                    model: model.to_string(),
                    temperature: 0.5,
                    top_p: 0.9,
                    max_tokens,
                },
            )
            .unwrap()
    }

    fn client(url: &str) -> ArgoClient {
        ArgoClient::new(url, "tester", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn request_shape_depends_on_model() {
        let client = client("https://argo.example/api/v1/chat/");

        let standard = client.build_request(&payload("gpt4o", 100_000), models::lookup("gpt4o").unwrap());
        assert_eq!(standard.system, "");
        assert_eq!(standard.prompt, vec!["summarize".to_string()]);
        assert_eq!(standard.max_tokens, Some(16384));
        assert_eq!(standard.temperature, Some(0.5));
        assert_eq!(standard.max_completion_tokens, None);

        let reasoning = client.build_request(&payload("gpto1mini", 1000), models::lookup("gpto1mini").unwrap());
        assert_eq!(reasoning.temperature, None);
        assert_eq!(reasoning.max_tokens, None);
        assert_eq!(reasoning.max_completion_tokens, Some(1000));

        let json = serde_json::to_value(&reasoning).unwrap();
        assert!(json.get("temperature").is_none());
        assert_eq!(json["stop"], serde_json::json!([]));
    }

    #[test]
    fn default_system_prompt_is_counted_before_sending() {
        let library = PromptLibrary::builtin();
        let resolved = PromptSource::Default
            .resolve(&library, Some("summarize this".to_string()), DEFAULT_SYSTEM_PROMPT)
            .unwrap();
        let parameters = ModelParameters {
            model: "gpt4".to_string(),
            temperature: 0.7,
            top_p: 0.9,
            max_tokens: 100,
        };
        let counter = TokenCounter::for_model("gpt4");
        let window = counter.count(DEFAULT_SYSTEM_PROMPT) + counter.count("summarize this") + 100;

        let payload = PromptAssembler::new(window)
            .assemble(
                &resolved.user_prompt,
                resolved.system_prompt.as_deref(),
                &[],
                parameters.clone(),
            )
            .unwrap();
        let request = client("https://argo.example/api/chat")
            .build_request(&payload, models::lookup("gpt4").unwrap());

        assert_eq!(request.system, DEFAULT_SYSTEM_PROMPT);
        let sent = counter.count(&request.system) + counter.count(&request.prompt[0]);
        assert_eq!(sent, payload.token_count);
        assert!(sent <= payload.token_budget);

        let err = PromptAssembler::new(window - 1)
            .assemble(
                &resolved.user_prompt,
                resolved.system_prompt.as_deref(),
                &[],
                parameters,
            )
            .unwrap_err();
        assert!(matches!(err, AgentError::ContextTooLarge { .. }));
    }

    #[test]
    fn rejects_bad_configuration() {
        assert!(matches!(
            ArgoClient::new("not a url", "u", Duration::from_secs(1)),
            Err(AgentError::Configuration(_))
        ));
        assert!(matches!(
            ArgoClient::new("ftp://host/x", "u", Duration::from_secs(1)),
            Err(AgentError::Configuration(_))
        ));
        assert!(matches!(
            ArgoClient::new("https://host/x", " ", Duration::from_secs(1)),
            Err(AgentError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn successful_exchange() {
        let (url, received) = one_shot_server("200 OK", r#"{"response": "All good."}"#);
        let client = client(&url);
        let request = client.build_request(&payload("gpt4", 100), models::lookup("gpt4").unwrap());

        let response = client.generate(&request).await.unwrap();
        assert_eq!(response.content, "All good.");
        assert!(response.usage.is_none());

        let sent: serde_json::Value = serde_json::from_str(&received.recv().unwrap()).unwrap();
        assert_eq!(sent["user"], "tester");
        assert_eq!(sent["model"], "gpt4");
        assert_eq!(sent["prompt"][0], "summarize");
        assert_eq!(sent["max_tokens"], 100);
    }

    #[tokio::test]
    async fn server_error_is_reported() {
        let (url, _received) = one_shot_server("503 Service Unavailable", r#"{"error": "busy"}"#);
        let client = client(&url);
        let request = client.build_request(&payload("gpt4", 100), models::lookup("gpt4").unwrap());

        let err = client.generate(&request).await.unwrap_err();
        match err {
            AgentError::ApiRequestFailed(message) => assert!(message.contains("503")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_reported() {
        let (url, _received) = one_shot_server("200 OK", r#"{"unexpected": true}"#);
        let client = client(&url);
        let request = client.build_request(&payload("gpt4", 100), models::lookup("gpt4").unwrap());

        let err = client.generate(&request).await.unwrap_err();
        assert!(matches!(err, AgentError::ApiRequestFailed(m) if m.contains("malformed")));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_reported() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        drop(listener);

        let client = client(&url);
        let request = client.build_request(&payload("gpt4", 100), models::lookup("gpt4").unwrap());
        let err = client.generate(&request).await.unwrap_err();
        assert!(matches!(err, AgentError::ApiRequestFailed(_)));
    }
}
