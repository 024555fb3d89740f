//! Retrieval requests and the chunks they return

use std::collections::HashMap;

use serde::Serialize;

use super::entity::KnowledgeBaseId;
use super::validation::{validate_number_of_results, KnowledgeBaseValidationError};

/// Default number of chunks requested per query
pub const DEFAULT_NUMBER_OF_RESULTS: u32 = 5;

/// Similarity search against a knowledge base
#[derive(Debug, Clone)]
pub struct RetrieveRequest {
    pub knowledge_base_id: KnowledgeBaseId,
    pub query: String,
    pub number_of_results: u32,
    /// Pagination token from a previous page
    pub next_token: Option<String>,
}

impl RetrieveRequest {
    pub fn new(knowledge_base_id: KnowledgeBaseId, query: impl Into<String>) -> Self {
        Self {
            knowledge_base_id,
            query: query.into(),
            number_of_results: DEFAULT_NUMBER_OF_RESULTS,
            next_token: None,
        }
    }

    pub fn with_number_of_results(mut self, number_of_results: u32) -> Self {
        self.number_of_results = number_of_results;
        self
    }

    pub fn with_next_token(mut self, token: impl Into<String>) -> Self {
        self.next_token = Some(token.into());
        self
    }

    pub fn validate(&self) -> Result<(), KnowledgeBaseValidationError> {
        validate_number_of_results(self.number_of_results)
    }
}

/// Where a chunk came from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkLocation {
    /// Location type tag, e.g. `S3`
    pub location_type: String,
    pub uri: Option<String>,
}

impl ChunkLocation {
    pub fn s3(uri: impl Into<String>) -> Self {
        Self {
            location_type: "S3".to_string(),
            uri: Some(uri.into()),
        }
    }
}

impl std::fmt::Display for ChunkLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.uri {
            Some(uri) => write!(f, "{} {}", self.location_type, uri),
            None => write!(f, "{}", self.location_type),
        }
    }
}

/// One retrieved unit of indexed content
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedChunk {
    pub content: String,
    pub location: Option<ChunkLocation>,
    /// Relevance assigned by the service, higher is better
    pub score: Option<f64>,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl RetrievedChunk {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            location: None,
            score: None,
            metadata: HashMap::new(),
        }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_location(mut self, location: ChunkLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn with_all_metadata(mut self, metadata: HashMap<String, serde_json::Value>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// One page of retrieval results, in service order
#[derive(Debug, Clone, Default, Serialize)]
pub struct RetrievalPage {
    pub chunks: Vec<RetrievedChunk>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

impl RetrievalPage {
    pub fn new(chunks: Vec<RetrievedChunk>) -> Self {
        Self {
            chunks,
            next_token: None,
        }
    }

    pub fn with_next_token(mut self, token: impl Into<String>) -> Self {
        self.next_token = Some(token.into());
        self
    }

    pub fn has_more(&self) -> bool {
        self.next_token.is_some()
    }
}
