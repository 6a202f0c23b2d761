//! brand-gen: staged concept-to-profile workflow.

pub mod brand;
pub mod channels;
pub mod config;
pub mod error;
pub mod generator;
pub mod llm;
