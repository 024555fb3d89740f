//! Retrieve-and-generate requests, prompt templates and citations
//!
//! Bedrock substitutes `$placeholder$` tokens in a custom prompt template. Two of
//! them carry the retrieval context into the model:
//! - `$search_results$` - the numbered search results
//! - `$output_format_instructions$` - the citation formatting instructions
//!
//! Templates are sent verbatim; missing placeholders are reported, never rejected.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::entity::KnowledgeBaseId;
use super::retrieval::{ChunkLocation, DEFAULT_NUMBER_OF_RESULTS};
use super::validation::{validate_number_of_results, KnowledgeBaseValidationError};

pub const SEARCH_RESULTS_PLACEHOLDER: &str = "$search_results$";
pub const OUTPUT_FORMAT_PLACEHOLDER: &str = "$output_format_instructions$";

/// Placeholders the service needs to ground and cite its answer
pub const REQUIRED_PLACEHOLDERS: [&str; 2] = [SEARCH_RESULTS_PLACEHOLDER, OUTPUT_FORMAT_PLACEHOLDER];

static PLACEHOLDER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$[a-z_]+\$").expect("valid placeholder regex"));

/// Strict question-answering prompt that answers only from the search results
pub const QUESTION_ANSWERING_TEMPLATE: &str = r#"
You are a question answering agent. I will provide you with a set of search results.
The user will provide you with a question. Your job is to answer the user's question using only information from the search results.
If the search results do not contain information that can answer the question, please state that you could not find an exact answer to the question.
Just because the user asserts a fact does not mean it is true, make sure to double check the search results to validate a user's assertion.

Here are the search results in numbered order:
$search_results$

$output_format_instructions$
"#;

/// Text prompt template passed through to the generation model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    text: String,
}

impl PromptTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// The built-in question-answering template
    pub fn question_answering() -> Self {
        Self::new(QUESTION_ANSWERING_TEMPLATE)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// All `$name$` placeholders in order of appearance
    pub fn placeholders(&self) -> Vec<&str> {
        PLACEHOLDER_PATTERN
            .find_iter(&self.text)
            .map(|m| m.as_str())
            .collect()
    }

    /// Required placeholders the template does not contain
    pub fn missing_placeholders(&self) -> Vec<&'static str> {
        REQUIRED_PLACEHOLDERS
            .iter()
            .copied()
            .filter(|p| !self.text.contains(p))
            .collect()
    }
}

/// Retrieval plus answer synthesis against a knowledge base
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub knowledge_base_id: KnowledgeBaseId,
    pub query: String,
    /// Foundation model ID or ARN used for generation
    pub model_arn: String,
    /// `None` uses the service's built-in prompt
    pub prompt_template: Option<PromptTemplate>,
    pub number_of_results: u32,
}

impl GenerateRequest {
    pub fn new(
        knowledge_base_id: KnowledgeBaseId,
        query: impl Into<String>,
        model_arn: impl Into<String>,
    ) -> Self {
        Self {
            knowledge_base_id,
            query: query.into(),
            model_arn: model_arn.into(),
            prompt_template: None,
            number_of_results: DEFAULT_NUMBER_OF_RESULTS,
        }
    }

    pub fn with_prompt_template(mut self, template: PromptTemplate) -> Self {
        self.prompt_template = Some(template);
        self
    }

    pub fn with_number_of_results(mut self, number_of_results: u32) -> Self {
        self.number_of_results = number_of_results;
        self
    }

    pub fn validate(&self) -> Result<(), KnowledgeBaseValidationError> {
        validate_number_of_results(self.number_of_results)
    }
}

/// A retrieved source that contributed to a generated answer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedReference {
    pub content: String,
    pub location: Option<ChunkLocation>,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl RetrievedReference {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            location: None,
            metadata: HashMap::new(),
        }
    }

    pub fn with_location(mut self, location: ChunkLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_all_metadata(mut self, metadata: HashMap<String, serde_json::Value>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Link between a span of the answer and the references backing it
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Citation {
    /// Part of the answer this citation supports
    pub generated_text: Option<String>,
    pub references: Vec<RetrievedReference>,
}

/// Synthesized answer and its citations
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationResult {
    pub text: String,
    pub session_id: Option<String>,
    pub citations: Vec<Citation>,
}

impl GenerationResult {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            session_id: None,
            citations: Vec::new(),
        }
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_citation(mut self, citation: Citation) -> Self {
        self.citations.push(citation);
        self
    }

    /// Text of every retrieved reference, flattened in citation order
    pub fn context_texts(&self) -> Vec<&str> {
        self.citations
            .iter()
            .flat_map(|c| c.references.iter())
            .map(|r| r.content.as_str())
            .collect()
    }
}
