//! The relay pipeline: validate, build prompt, call the model, shape the reply.

use crate::error::InsightError;
use crate::models::{parse_object, GeneratedData, GeneratedResponse, PayloadError, SummaryResponse};
use crate::services::metrics;
use crate::services::prompts;
use crate::services::providers::{ProviderError, ProviderResponse, TextProvider};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Stateless request pipeline shared by both endpoints.
#[derive(Clone)]
pub struct AnalysisService {
    provider: Arc<dyn TextProvider>,
    timeout: Duration,
}

impl AnalysisService {
    pub fn new(provider: Arc<dyn TextProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub fn provider(&self) -> &Arc<dyn TextProvider> {
        &self.provider
    }

    /// Summarize a webhook body. The body must decode to a JSON object.
    pub async fn summarize(&self, body: &[u8]) -> Result<SummaryResponse, InsightError> {
        let payload = parse_object(body)?;

        let prompt = prompts::summary_prompt(&payload).map_err(PayloadError::Malformed)?;
        if prompt.truncated {
            metrics::record_truncation();
        }

        let output = self.call_model(&prompt.text).await?;
        let response = SummaryResponse::new(payload, output.text);

        match serde_json::to_string_pretty(&response) {
            Ok(log_entry) => tracing::info!(log_entry = %log_entry, "Entrada recebida"),
            Err(e) => tracing::warn!(error = %e, "Failed to render summary log entry"),
        }

        Ok(response)
    }

    /// Ask the model for a sample dataset. Unparseable output is returned as text.
    pub async fn generate_sample(&self) -> Result<GeneratedResponse, InsightError> {
        let output = self.call_model(&prompts::generation_prompt()).await?;

        let data = GeneratedData::from_model_output(output.text);
        if let GeneratedData::Raw(_) = &data {
            tracing::debug!("Generated sample is not valid JSON, returning raw text");
        }
        metrics::record_generated_output(data.kind());

        Ok(GeneratedResponse {
            json_para_envio: data,
        })
    }

    /// Single provider call bounded by the configured timeout. No retries.
    async fn call_model(&self, prompt: &str) -> Result<ProviderResponse, ProviderError> {
        let provider = self.provider.name();
        let model = self.provider.model().to_string();
        let start = Instant::now();

        let result = tokio::time::timeout(self.timeout, self.provider.generate(prompt))
            .await
            .unwrap_or(Err(ProviderError::Timeout(self.timeout)));

        metrics::record_provider_latency(provider, &model, start.elapsed().as_secs_f64());

        match &result {
            Ok(response) => {
                metrics::record_tokens(&model, response.input_tokens, response.output_tokens);
                tracing::debug!(
                    provider,
                    model = %model,
                    output_len = response.text.len(),
                    "Model call succeeded"
                );
            }
            Err(e) => {
                metrics::record_provider_error(provider, e.kind());
                tracing::error!(provider, model = %model, error = %e, "Model call failed");
            }
        }

        result
    }
}
