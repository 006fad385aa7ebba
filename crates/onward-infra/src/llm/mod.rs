//! LLM provider implementations.
//!
//! Only AWS Bedrock is wired up. [`create_provider`] resolves the region and
//! bearer token from configuration and wraps the provider for dynamic dispatch.

pub mod bedrock;

use secrecy::SecretString;

use onward_core::llm::box_provider::BoxLlmProvider;
use onward_types::config::LlmConfig;
use onward_types::llm::LlmError;

use self::bedrock::BedrockProvider;

/// Environment variable holding the Bedrock API key (bearer token).
pub const BEDROCK_TOKEN_ENV: &str = "AWS_BEARER_TOKEN_BEDROCK";

/// Region used when neither config, `AWS_REGION` nor the token names one.
pub const DEFAULT_REGION: &str = "eu-west-2";

/// Build a boxed Bedrock provider from the `[llm]` section.
///
/// Region precedence: `llm.region`, then a region embedded in the token,
/// then `AWS_REGION`, then [`DEFAULT_REGION`].
pub fn create_provider(config: &LlmConfig, api_key: Option<&str>) -> Result<BoxLlmProvider, LlmError> {
    let key = api_key
        .filter(|k| !k.trim().is_empty())
        .ok_or(LlmError::AuthenticationFailed)?;
    let fallback_region =
        std::env::var("AWS_REGION").unwrap_or_else(|_| DEFAULT_REGION.to_string());
    let provider = BedrockProvider::new(
        SecretString::from(key.trim().to_string()),
        config.model.clone(),
        config.region.clone(),
        fallback_region,
    )?;
    Ok(BoxLlmProvider::new(provider))
}
