//! Fixed generation parameters for the composition service.
//!
//! These are named constants by design - end users cannot reconfigure the
//! model, budgets, or persona at runtime. `ServiceConfig` exists so tests can
//! point the service at a mock upstream; everything defaults to the constants
//! below.

use std::time::Duration;

/// Model identifier sent to the upstream provider.
pub const MODEL: &str = "gpt-4o";

/// Hard ceiling on generated tokens per response.
pub const MAX_OUTPUT_TOKENS: u32 = 1024;

/// Sampling temperature, biased toward deterministic analytical output.
pub const TEMPERATURE: f32 = 0.3;

/// Retries of the upstream call on transient failure, after the initial
/// attempt. Never applied once output has started streaming.
pub const MAX_RETRIES: u32 = 3;

/// Wall-clock budget for one full streamed request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default upstream chat-completions endpoint.
pub const UPSTREAM_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Environment variable holding the upstream API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Non-user-editable system directive describing the assistant's persona.
pub const SYSTEM_DIRECTIVE: &str = "You are an expert in understanding and analyzing diagrams. \
You have a great in-depth understanding of how systems work and you are expert in system design. \
You can easily understand any concept related to it and provide insights accordingly.";

/// Resolved configuration for one service instance.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub model: String,
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub max_retries: u32,
    pub request_timeout: Duration,
    pub upstream_url: String,
    pub api_key: String,
    pub system_directive: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            model: MODEL.to_string(),
            max_output_tokens: MAX_OUTPUT_TOKENS,
            temperature: TEMPERATURE,
            max_retries: MAX_RETRIES,
            request_timeout: REQUEST_TIMEOUT,
            upstream_url: UPSTREAM_URL.to_string(),
            api_key: std::env::var(API_KEY_ENV).unwrap_or_default(),
            system_directive: SYSTEM_DIRECTIVE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let config = ServiceConfig {
            api_key: String::new(),
            ..ServiceConfig::default()
        };
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.max_output_tokens, 1024);
        assert!((config.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }
}
