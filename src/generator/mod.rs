//! Option generation: the client contract and the completion-text parser.

mod client;
mod parse;

pub use client::{GeneratorClient, GeneratorConfig, LlmGenerator};
pub use parse::parse_batch;
