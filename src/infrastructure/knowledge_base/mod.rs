//! Knowledge base provider implementations

mod bedrock_agent;
mod bedrock_runtime;
mod document;

pub use bedrock_agent::BedrockKnowledgeBaseManager;
pub use bedrock_runtime::BedrockKnowledgeBaseRuntime;
pub use document::{doc_to_json, metadata_to_json};
