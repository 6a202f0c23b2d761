//! Bridges rig's `CompletionModel` to our `LlmProvider` trait.

use async_trait::async_trait;
use rig::completion::{CompletionError, CompletionModel};
use rig::message::{AssistantContent, Message};
use rig::OneOrMany;
use rust_decimal::Decimal;
use serde_json::Value;

use super::costs::model_cost;
use super::provider::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, LlmProvider, Role,
};
use crate::error::LlmError;

/// Wraps any rig completion model behind `LlmProvider`.
pub struct RigAdapter<M> {
    model: M,
    model_name: String,
    provider: &'static str,
}

impl<M: CompletionModel> RigAdapter<M> {
    pub fn new(model: M, model_name: &str, provider: &'static str) -> Self {
        Self {
            model,
            model_name: model_name.to_string(),
            provider,
        }
    }
}

#[async_trait]
impl<M> LlmProvider for RigAdapter<M>
where
    M: CompletionModel + Send + Sync + 'static,
{
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn cost_per_token(&self) -> (Decimal, Decimal) {
        model_cost(&self.model_name)
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let (history, prompt) =
            split_prompt(&request.messages).ok_or_else(|| LlmError::RequestFailed {
                provider: self.provider.to_string(),
                reason: "request has no user message".to_string(),
            })?;

        let mut builder = self.model.completion_request(to_rig(prompt));
        for message in history {
            builder = builder.message(to_rig(message));
        }
        if let Some(preamble) = request.system_prompt() {
            builder = builder.preamble(preamble);
        }
        if let Some(temperature) = request.temperature {
            builder = builder.temperature(f64::from(temperature));
        }
        if let Some(max_tokens) = request.max_tokens {
            builder = builder.max_tokens(u64::from(max_tokens));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| map_completion_error(self.provider, e))?;

        // Stop reason and id only live in the vendor payload.
        let raw = serde_json::to_value(&response.raw_response).unwrap_or(Value::Null);

        Ok(CompletionResponse {
            content: collect_text(&response.choice),
            input_tokens: saturate(response.usage.input_tokens),
            output_tokens: saturate(response.usage.output_tokens),
            finish_reason: finish_reason(&raw),
            response_id: raw.get("id").and_then(Value::as_str).map(String::from),
        })
    }
}

/// Split non-system messages into (history, final user prompt).
fn split_prompt(messages: &[ChatMessage]) -> Option<(Vec<&ChatMessage>, &ChatMessage)> {
    let mut turns: Vec<&ChatMessage> = messages.iter().filter(|m| m.role != Role::System).collect();
    match turns.pop() {
        Some(last) if last.role == Role::User => Some((turns, last)),
        _ => None,
    }
}

fn to_rig(message: &ChatMessage) -> Message {
    match message.role {
        Role::Assistant => Message::assistant(message.content.clone()),
        Role::User | Role::System => Message::user(message.content.clone()),
    }
}

fn collect_text(choice: &OneOrMany<AssistantContent>) -> String {
    choice
        .iter()
        .filter_map(|content| match content {
            AssistantContent::Text(text) => Some(text.text.as_str()),
            _ => None,
        })
        .collect()
}

/// Read the stop reason from Anthropic, Chat Completions or Responses payloads.
fn finish_reason(raw: &Value) -> FinishReason {
    let reason = raw
        .get("stop_reason")
        .or_else(|| raw.pointer("/choices/0/finish_reason"))
        .or_else(|| raw.pointer("/incomplete_details/reason"))
        .or_else(|| raw.get("status"))
        .and_then(Value::as_str);
    FinishReason::from_provider(reason)
}

fn map_completion_error(provider: &str, err: CompletionError) -> LlmError {
    let reason = err.to_string();
    let lower = reason.to_ascii_lowercase();

    if lower.contains("401") || lower.contains("authentication") || lower.contains("api key") {
        LlmError::AuthFailed {
            provider: provider.to_string(),
        }
    } else if lower.contains("429") || lower.contains("rate limit") || lower.contains("rate_limit") {
        LlmError::RateLimited {
            provider: provider.to_string(),
            retry_after: None,
        }
    } else if matches!(
        err,
        CompletionError::JsonError(_) | CompletionError::ResponseError(_)
    ) {
        LlmError::InvalidResponse {
            provider: provider.to_string(),
            reason,
        }
    } else {
        LlmError::RequestFailed {
            provider: provider.to_string(),
            reason,
        }
    }
}

fn saturate(tokens: u64) -> u32 {
    u32::try_from(tokens).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn prompt_is_last_user_message() {
        let messages = vec![
            ChatMessage::system("be brief"),
            ChatMessage::user("first"),
            ChatMessage {
                role: Role::Assistant,
                content: "ok".into(),
            },
            ChatMessage::user("second"),
        ];
        let (history, prompt) = split_prompt(&messages).unwrap();
        assert_eq!(prompt.content, "second");
        let history: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(history, vec!["first", "ok"]);
    }

    #[test]
    fn prompt_requires_trailing_user_message() {
        assert!(split_prompt(&[ChatMessage::system("only system")]).is_none());
        let trailing_assistant = vec![
            ChatMessage::user("q"),
            ChatMessage {
                role: Role::Assistant,
                content: "a".into(),
            },
        ];
        assert!(split_prompt(&trailing_assistant).is_none());
    }

    #[test]
    fn text_parts_are_concatenated() {
        let choice = OneOrMany::many(vec![
            AssistantContent::text("Comment: hi\n"),
            AssistantContent::text("1. One: first"),
        ])
        .unwrap();
        assert_eq!(collect_text(&choice), "Comment: hi\n1. One: first");
    }

    #[test]
    fn finish_reason_from_vendor_payloads() {
        assert_eq!(finish_reason(&json!({"stop_reason": "max_tokens"})), FinishReason::Length);
        assert_eq!(
            finish_reason(&json!({"choices": [{"finish_reason": "stop"}]})),
            FinishReason::Stop
        );
        assert_eq!(
            finish_reason(&json!({"status": "incomplete", "incomplete_details": {"reason": "max_output_tokens"}})),
            FinishReason::Length
        );
        assert_eq!(finish_reason(&json!({"status": "completed"})), FinishReason::Stop);
        assert_eq!(finish_reason(&Value::Null), FinishReason::Unknown);
    }

    #[test]
    fn provider_errors_are_classified() {
        let auth = map_completion_error(
            "anthropic",
            CompletionError::ProviderError("401 authentication_error: invalid x-api-key".into()),
        );
        assert!(matches!(auth, LlmError::AuthFailed { .. }));

        let limited = map_completion_error(
            "openai",
            CompletionError::ProviderError("429 Rate limit reached".into()),
        );
        assert!(matches!(limited, LlmError::RateLimited { retry_after: None, .. }));

        let garbled = map_completion_error(
            "openai",
            CompletionError::ResponseError("missing choices".into()),
        );
        assert!(matches!(garbled, LlmError::InvalidResponse { .. }));

        let other = map_completion_error(
            "anthropic",
            CompletionError::ProviderError("overloaded".into()),
        );
        assert!(matches!(other, LlmError::RequestFailed { ref reason, .. } if reason.contains("overloaded")));
    }

    #[test]
    fn token_counts_saturate() {
        assert_eq!(saturate(42), 42);
        assert_eq!(saturate(u64::MAX), u32::MAX);
    }
}
