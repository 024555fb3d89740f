//! Domain layer - Core entities and service traits

pub mod error;
pub mod knowledge_base;
pub mod storage;

pub use error::DomainError;
pub use knowledge_base::{
    ChunkingStrategy, Citation, CreateKnowledgeBaseRequest, DataSource, DataSourceId,
    DataSourceSpec, GenerateRequest, GenerationResult, IngestionJob, IngestionJobId,
    IngestionJobStatus, KnowledgeBase, KnowledgeBaseId, KnowledgeBaseManager,
    KnowledgeBaseRuntime, KnowledgeBaseStatus, KnowledgeBaseValidationError, PollPolicy,
    PromptTemplate, RetrievalPage, RetrieveRequest, RetrievedChunk,
};
pub use storage::ObjectStore;
