//! Scripted generator shared by the workflow tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::LlmError;
use crate::generator::GeneratorClient;

use super::model::{GeneratedBatch, StageOption};

/// Build a batch from `(short, full)` pairs.
pub(crate) fn batch(lead: &str, options: &[(&str, &str)]) -> GeneratedBatch {
    GeneratedBatch {
        lead_comment: lead.to_string(),
        options: options
            .iter()
            .map(|(short, full)| StageOption::new(*short, *full))
            .collect(),
        description: None,
    }
}

/// Replies from a queue and records every prompt it receives.
///
/// An exhausted queue answers with three generic options.
#[derive(Default)]
pub(crate) struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<GeneratedBatch, LlmError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, reply: GeneratedBatch) -> &Self {
        self.replies.lock().unwrap().push_back(Ok(reply));
        self
    }

    pub(crate) fn push_error(&self, error: LlmError) -> &Self {
        self.replies.lock().unwrap().push_back(Err(error));
        self
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub(crate) fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl GeneratorClient for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<GeneratedBatch, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let next = self.replies.lock().unwrap().pop_front();
        next.unwrap_or_else(|| {
            Ok(batch(
                "Pick one",
                &[("One", "Option one"), ("Two", "Option two"), ("Three", "Option three")],
            ))
        })
    }
}
