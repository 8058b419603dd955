//! LLM boundary: the completion-provider trait, the retrying client, and
//! JSON extraction from free-form replies.

pub mod client;
pub mod extraction;

pub use client::{CompletionProvider, CompletionRequest, LlmClient, LlmError, ProviderError};
pub use extraction::{extract_json, ExpectedShape, ParseError};
