//! Knowledge Base domain - managed vector index, ingestion and queries

mod chunking;
mod entity;
mod generation;
mod ingestion;
mod provider;
mod retrieval;
mod validation;

pub use chunking::ChunkingStrategy;
pub use entity::{
    CreateKnowledgeBaseRequest, DataSource, DataSourceId, DataSourceSpec, DataSourceStatus,
    DataSourceType, FieldMapping, IngestionJobId, KnowledgeBase, KnowledgeBaseId,
    KnowledgeBaseStatus, VectorStorage,
};
pub use generation::{
    Citation, GenerateRequest, GenerationResult, PromptTemplate, RetrievedReference,
    OUTPUT_FORMAT_PLACEHOLDER, QUESTION_ANSWERING_TEMPLATE, REQUIRED_PLACEHOLDERS,
    SEARCH_RESULTS_PLACEHOLDER,
};
pub use ingestion::{IngestionJob, IngestionJobStatus, IngestionStatistics, PollPolicy};
pub use provider::{KnowledgeBaseManager, KnowledgeBaseRuntime};
pub use retrieval::{
    ChunkLocation, RetrievalPage, RetrieveRequest, RetrievedChunk, DEFAULT_NUMBER_OF_RESULTS,
};
pub use validation::{
    validate_bucket_name, validate_knowledge_base_id, validate_number_of_results,
    KnowledgeBaseValidationError, MAX_NUMBER_OF_RESULTS,
};

#[cfg(test)]
pub use provider::mock::{MockKnowledgeBaseManager, MockKnowledgeBaseRuntime};
