//! BedrockProvider -- concrete [`LlmProvider`] implementation for AWS Bedrock.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is never logged
//! or included in `Debug` output.

use std::time::Duration;

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};

use onward_core::llm::provider::LlmProvider;
use onward_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, ProviderCapabilities, StopReason, Usage,
};

use super::types::{
    AnthropicContentBlock, AnthropicMessage, AnthropicNonStreamResponse, BedrockRequest,
};

/// AWS Bedrock Claude provider.
///
/// The API key is stored as a [`SecretString`] and is only exposed when
/// constructing the `Authorization` header.
pub struct BedrockProvider {
    client: reqwest::Client,
    api_key: SecretString,
    region: String,
    model_id: String,
    capabilities: ProviderCapabilities,
}

impl BedrockProvider {
    const API_VERSION: &'static str = "bedrock-2023-05-31";

    /// Prefix used to identify Bedrock API keys.
    const KEY_PREFIX: &'static str = "bedrock-api-key-";

    /// Create a new Bedrock provider.
    ///
    /// * `api_key` - Bedrock bearer token. A leading `bedrock-api-key-` is
    ///   stripped and the remainder is sent as the Bearer token.
    /// * `model` - Claude model name or a fully qualified Bedrock model id.
    /// * `region` - Explicit region; wins over anything else.
    /// * `fallback_region` - Used when `region` is `None` and the token does
    ///   not embed a credential scope.
    pub fn new(
        api_key: SecretString,
        model: String,
        region: Option<String>,
        fallback_region: String,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| LlmError::Provider {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        let raw_key = api_key.expose_secret();
        let token_part = raw_key.strip_prefix(Self::KEY_PREFIX).unwrap_or(raw_key);
        let effective_region = region
            .or_else(|| Self::detect_region_from_token(token_part))
            .unwrap_or(fallback_region);
        let bearer_token = SecretString::from(token_part.to_string());

        let model_id = Self::to_bedrock_model_id(&model, &effective_region);
        let capabilities = Self::capabilities_for_model(&model);

        Ok(Self {
            client,
            api_key: bearer_token,
            region: effective_region,
            model_id,
            capabilities,
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Try to extract the AWS region from a base64-encoded presigned URL token.
    ///
    /// The token decodes to a URL carrying
    /// `X-Amz-Credential=<key>/<date>/<region>/bedrock/aws4_request`.
    fn detect_region_from_token(token: &str) -> Option<String> {
        use base64::Engine;
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(token)
            .ok()?;
        let text = String::from_utf8(decoded).ok()?;

        let cred_start = text.find("X-Amz-Credential=")?;
        let cred_value = &text[cred_start + "X-Amz-Credential=".len()..];
        // URL-encoded slashes are common in presigned URLs.
        let cred_value = cred_value.replace("%2F", "/");
        let parts: Vec<&str> = cred_value.split('/').collect();
        let region = parts.get(2)?.split('&').next()?;
        if region.is_empty() {
            return None;
        }
        tracing::info!(region = %region, "Detected region from Bedrock bearer token");
        Some(region.to_string())
    }

    /// Convert a Claude model name to a Bedrock cross-region inference profile id.
    ///
    /// ```text
    /// ("claude-3-7-sonnet-20250219", "eu-west-2") → "eu.anthropic.claude-3-7-sonnet-20250219-v1:0"
    /// ("anthropic.claude-3-7-sonnet-20250219-v1:0", _) → unchanged
    /// ```
    pub fn to_bedrock_model_id(model: &str, region: &str) -> String {
        if model.contains('.') {
            model.to_string()
        } else {
            let region_prefix = region.split('-').next().unwrap_or("us");
            format!("{region_prefix}.anthropic.{model}-v1:0")
        }
    }

    fn capabilities_for_model(model: &str) -> ProviderCapabilities {
        let max_output_tokens = if model.contains("opus") {
            32_000
        } else if model.contains("sonnet") || model.contains("haiku") {
            8_192
        } else {
            4_096
        };
        ProviderCapabilities {
            streaming: false,
            tool_calling: false,
            max_context_tokens: 200_000,
            max_output_tokens,
        }
    }

    /// Build the full Bedrock Runtime URL for a given action.
    fn url(&self, action: &str) -> String {
        format!(
            "https://bedrock-runtime.{}.amazonaws.com/model/{}/{}",
            self.region, self.model_id, action
        )
    }

    fn to_bedrock_request(&self, request: &CompletionRequest) -> BedrockRequest {
        let messages = request
            .messages
            .iter()
            .map(|m| AnthropicMessage {
                role: m.role.to_string(),
                content: m.content.clone(),
            })
            .collect();

        BedrockRequest {
            anthropic_version: Self::API_VERSION.to_string(),
            max_tokens: request.max_tokens,
            messages,
            system: request.system.clone(),
            temperature: request.temperature,
            stop_sequences: request.stop_sequences.clone(),
        }
    }
}

/// Map a non-success HTTP status and body to an [`LlmError`].
pub(crate) fn map_error_status(status: StatusCode, body: String) -> LlmError {
    match status.as_u16() {
        401 | 403 => LlmError::Provider {
            message: format!("Bedrock authentication failed (HTTP {status}): {body}"),
        },
        400 => LlmError::InvalidRequest(body),
        429 => LlmError::RateLimited {
            retry_after_ms: None,
        },
        529 => LlmError::Overloaded(body),
        s if s >= 500 => LlmError::Provider {
            message: format!("Bedrock server error HTTP {status}: {body}"),
        },
        _ => LlmError::Provider {
            message: format!("HTTP {status}: {body}"),
        },
    }
}

/// Flatten a Bedrock response into the provider-neutral shape.
pub(crate) fn into_completion(resp: AnthropicNonStreamResponse) -> CompletionResponse {
    let content = resp
        .content
        .iter()
        .filter_map(|block| match block {
            AnthropicContentBlock::Text { text } => Some(text.as_str()),
            AnthropicContentBlock::Other => None,
        })
        .collect::<Vec<_>>()
        .join("");

    let stop_reason = resp
        .stop_reason
        .as_deref()
        .and_then(|s| s.parse().ok())
        .unwrap_or(StopReason::EndTurn);

    CompletionResponse {
        id: resp.id,
        content,
        model: resp.model,
        stop_reason,
        usage: Usage {
            input_tokens: resp.usage.input_tokens,
            output_tokens: resp.usage.output_tokens,
            cache_creation_input_tokens: resp.usage.cache_creation_input_tokens,
            cache_read_input_tokens: resp.usage.cache_read_input_tokens,
        },
    }
}

// No Debug derive: keeps the bearer token out of formatted output.

impl LlmProvider for BedrockProvider {
    fn name(&self) -> &str {
        "bedrock"
    }

    fn capabilities(&self) -> &ProviderCapabilities {
        &self.capabilities
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = self.to_bedrock_request(request);
        let url = self.url("invoke");

        tracing::debug!(url = %url, model_id = %self.model_id, region = %self.region, "Bedrock invoke request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key.expose_secret()))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Provider {
                message: format!("HTTP request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %error_body, url = %url, "Bedrock API error response");
            return Err(map_error_status(status, error_body));
        }

        let bedrock_resp: AnthropicNonStreamResponse = response.json().await.map_err(|e| {
            LlmError::Deserialization(format!("failed to parse response: {e}"))
        })?;

        let completion = into_completion(bedrock_resp);
        tracing::debug!(
            input_tokens = completion.usage.input_tokens,
            output_tokens = completion.usage.output_tokens,
            stop_reason = %completion.stop_reason,
            "Bedrock invoke complete"
        );
        Ok(completion)
    }
}
