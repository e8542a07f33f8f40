//! Gemini `generateContent` client
//!
//! - Endpoint: POST {api_base}/models/{model}:generateContent
//! - Auth: API key from the environment, sent as `x-goog-api-key`
//! - Construction via [`GeminiClient::connect`] issues a one-shot test call

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::config::GenerationConfig;
use crate::errors::{LoanQaError, Result};
use crate::generation::GenerationClient;

/// Default Gemini API base
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Prompt used for the startup connectivity check
const PING_PROMPT: &str = "Reply with the single word: ready";

/// Gemini REST client
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_base: String,
    model: String,
    api_key: String,
    timeout: Duration,
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl GeminiClient {
    /// Create a client with an explicit key
    pub fn new(api_key: impl Into<String>, config: &GenerationConfig) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LoanQaError::MissingCredential {
                var: config.api_key_env.clone(),
            });
        }

        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            timeout,
        })
    }

    /// Create a client reading the key from the process environment
    pub fn from_env(config: &GenerationConfig) -> Result<Self> {
        Self::from_lookup(config, |var| std::env::var(var).ok())
    }

    /// Create a client reading the key through `lookup`
    pub fn from_lookup<F>(config: &GenerationConfig, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let key = lookup(&config.api_key_env)
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| LoanQaError::MissingCredential {
                var: config.api_key_env.clone(),
            })?;
        Self::new(key, config)
    }

    /// Create from the environment and verify connectivity if configured
    pub async fn connect(config: &GenerationConfig) -> Result<Self> {
        let client = Self::from_env(config)?;
        if config.verify_on_connect {
            client.verify().await?;
        }
        Ok(client)
    }

    /// One-shot test call so configuration errors surface at startup
    pub async fn verify(&self) -> Result<()> {
        match self.generate(PING_PROMPT).await {
            Ok(_) => {
                tracing::info!(model = %self.model, "generation service reachable");
                Ok(())
            }
            Err(e @ LoanQaError::CredentialRejected { .. }) => Err(e),
            Err(e) => Err(LoanQaError::ConnectivityCheckFailed(e.to_string())),
        }
    }

    /// Full request URL for the configured model
    pub fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn map_send_error(&self, err: reqwest::Error) -> LoanQaError {
        if err.is_timeout() {
            LoanQaError::Timeout {
                duration_ms: self.timeout.as_millis() as u64,
            }
        } else {
            LoanQaError::Http(err)
        }
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&GenerateRequest::from_prompt(prompt))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(classify_error_response(status.as_u16(), &body));
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| self.map_send_error(e))?;
        parsed.into_text()
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Map a non-success response onto configuration vs transient failures
pub fn classify_error_response(status: u16, body: &str) -> LoanQaError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|env| env.error.message)
        .unwrap_or_else(|_| body.trim().to_string());

    let key_problem = message.contains("API key") || message.contains("API_KEY");
    match status {
        401 | 403 => LoanQaError::CredentialRejected { status, message },
        400 if key_problem => LoanQaError::CredentialRejected { status, message },
        _ => LoanQaError::Generation(format!("HTTP {}: {}", status, message)),
    }
}

/// generateContent request body
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    contents: Vec<Content>,
}

impl GenerateRequest {
    pub fn from_prompt(prompt: &str) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

/// generateContent response body
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate
    pub fn into_text(self) -> Result<String> {
        let text: String = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            Err(LoanQaError::EmptyResponse)
        } else {
            Ok(text)
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}
