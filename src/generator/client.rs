//! Generator client: prompt in, parsed option batch out.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::brand::model::GeneratedBatch;
use crate::error::LlmError;
use crate::llm::provider::{ChatMessage, CompletionRequest, FinishReason, LlmProvider};
use crate::llm::estimate_cost;

use super::parse::parse_batch;

const SYSTEM_PROMPT: &str = "You are a creative brand strategist helping someone shape a new \
     project. Be concrete and vivid, keep every item to one or two sentences and follow the \
     requested answer format exactly.";

/// Backend that turns a prompt into a batch of options.
///
/// Malformed backend output is `Ok` with no options; only transport-level
/// failures are errors.
#[async_trait]
pub trait GeneratorClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<GeneratedBatch, LlmError>;
}

/// Configuration for option generation.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Maximum number of options kept per batch.
    pub max_options: usize,
    /// LLM temperature.
    pub temperature: f32,
    /// Max tokens for the LLM response.
    pub max_tokens: u32,
    /// Upper bound on one generation call.
    pub timeout: Duration,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_options: 3,
            temperature: 0.8,
            max_tokens: 1024,
            timeout: Duration::from_secs(60),
        }
    }
}

/// `GeneratorClient` backed by an `LlmProvider`.
pub struct LlmGenerator {
    llm: Arc<dyn LlmProvider>,
    config: GeneratorConfig,
}

impl LlmGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>, config: GeneratorConfig) -> Self {
        Self { llm, config }
    }
}

#[async_trait]
impl GeneratorClient for LlmGenerator {
    async fn generate(&self, prompt: &str) -> Result<GeneratedBatch, LlmError> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ])
        .with_temperature(self.config.temperature)
        .with_max_tokens(self.config.max_tokens);

        let response = tokio::time::timeout(self.config.timeout, self.llm.complete(request))
            .await
            .map_err(|_| LlmError::Timeout {
                provider: self.llm.model_name().to_string(),
                after: self.config.timeout,
            })??;

        debug!(
            model = self.llm.model_name(),
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            cost_usd = %estimate_cost(
                self.llm.cost_per_token(),
                response.input_tokens,
                response.output_tokens
            ),
            "Generation complete"
        );
        if response.finish_reason == FinishReason::Length {
            warn!(
                max_tokens = self.config.max_tokens,
                "Generation hit the token limit, output may be cut short"
            );
        }

        let mut batch = parse_batch(&response.content);
        batch.options.truncate(self.config.max_options);

        if batch.options.is_empty() {
            warn!(
                response = %response.content,
                "No options could be parsed from the generation"
            );
        } else {
            info!(count = batch.options.len(), "Generated options");
        }

        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::sync::Mutex;

    use crate::llm::provider::{CompletionResponse, Role};

    struct StubLlm {
        reply: String,
        delay: Duration,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl StubLlm {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                delay: Duration::ZERO,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for StubLlm {
        fn model_name(&self) -> &str {
            "stub"
        }

        fn cost_per_token(&self) -> (Decimal, Decimal) {
            (Decimal::ZERO, Decimal::ZERO)
        }

        async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
            self.seen.lock().unwrap().push(request);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            Ok(CompletionResponse {
                content: self.reply.clone(),
                input_tokens: 10,
                output_tokens: 20,
                finish_reason: FinishReason::Stop,
                response_id: None,
            })
        }
    }

    struct FailingLlm;

    #[async_trait]
    impl LlmProvider for FailingLlm {
        fn model_name(&self) -> &str {
            "failing"
        }

        fn cost_per_token(&self) -> (Decimal, Decimal) {
            (Decimal::ZERO, Decimal::ZERO)
        }

        async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
            Err(LlmError::AuthFailed {
                provider: "failing".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn generate_parses_and_caps_options() {
        let llm = Arc::new(StubLlm::new(
            "Comment: Pick one\n1. A: one\n2. B: two\n3. C: three\n4. D: four",
        ));
        let generator = LlmGenerator::new(llm.clone(), GeneratorConfig::default());

        let batch = generator.generate("the prompt").await.unwrap();
        assert_eq!(batch.lead_comment, "Pick one");
        assert_eq!(batch.options.len(), 3);

        let seen = llm.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].messages[0].role, Role::System);
        assert_eq!(seen[0].messages[1].content, "the prompt");
        assert_eq!(seen[0].temperature, Some(0.8));
        assert_eq!(seen[0].max_tokens, Some(1024));
    }

    #[tokio::test]
    async fn malformed_reply_is_empty_batch_not_error() {
        let generator = LlmGenerator::new(
            Arc::new(StubLlm::new("I'd rather not.")),
            GeneratorConfig::default(),
        );
        let batch = generator.generate("p").await.unwrap();
        assert!(batch.options.is_empty());
    }

    #[tokio::test]
    async fn provider_errors_propagate() {
        let generator = LlmGenerator::new(Arc::new(FailingLlm), GeneratorConfig::default());
        let err = generator.generate("p").await.unwrap_err();
        assert!(matches!(err, LlmError::AuthFailed { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_provider_times_out() {
        let mut llm = StubLlm::new("Comment: late\n1. A: one");
        llm.delay = Duration::from_secs(120);
        let config = GeneratorConfig {
            timeout: Duration::from_secs(5),
            ..GeneratorConfig::default()
        };
        let generator = LlmGenerator::new(Arc::new(llm), config);

        let err = generator.generate("p").await.unwrap_err();
        assert!(matches!(err, LlmError::Timeout { after, .. } if after == Duration::from_secs(5)));
    }
}
