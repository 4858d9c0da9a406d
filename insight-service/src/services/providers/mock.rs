//! Mock provider implementation for testing.

use super::{ProviderError, ProviderResponse, TextProvider};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What the mock answers with.
#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Fail(ProviderError),
}

/// Scripted text provider that records every prompt it receives.
///
/// Clones share the recorded prompts, so a test can keep a handle after
/// moving the provider into application state.
#[derive(Debug, Clone)]
pub struct MockTextProvider {
    reply: Reply,
    delay: Option<Duration>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockTextProvider {
    /// Always answer with `text`.
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            reply: Reply::Text(text.into()),
            delay: None,
            prompts: Arc::default(),
        }
    }

    /// Always fail with `error`.
    pub fn failing(error: ProviderError) -> Self {
        Self {
            reply: Reply::Fail(error),
            delay: None,
            prompts: Arc::default(),
        }
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.prompts().len()
    }
}

/// Rough token estimate of four bytes per token, saturating.
fn approx_tokens(len: usize) -> i32 {
    i32::try_from(len / 4).unwrap_or(i32::MAX)
}

#[async_trait]
impl TextProvider for MockTextProvider {
    async fn generate(&self, prompt: &str) -> Result<ProviderResponse, ProviderError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.reply {
            Reply::Text(text) => Ok(ProviderResponse {
                text: text.clone(),
                input_tokens: approx_tokens(prompt.len()),
                output_tokens: approx_tokens(text.len()),
            }),
            Reply::Fail(error) => Err(error.clone()),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_prompts_across_clones() {
        let mock = MockTextProvider::replying("resposta");
        let handle = mock.clone();

        let response = mock.generate("pergunta longa").await.unwrap();
        assert_eq!(response.text, "resposta");
        assert_eq!(response.input_tokens, 3);
        assert_eq!(response.output_tokens, 2);
        assert_eq!(handle.prompts(), vec!["pergunta longa".to_string()]);
    }

    #[test]
    fn token_estimate_saturates() {
        assert_eq!(approx_tokens(0), 0);
        assert_eq!(approx_tokens(usize::MAX), i32::MAX);
    }
}
