//! AWS Bedrock Agent (control plane) implementation of knowledge base management

use std::fmt::Debug;

use async_trait::async_trait;
use aws_sdk_bedrockagent::types::{
    ChunkingConfiguration, ChunkingStrategy as SdkChunkingStrategy, DataSourceConfiguration,
    DataSourceType as SdkDataSourceType, FixedSizeChunkingConfiguration,
    HierarchicalChunkingConfiguration, HierarchicalChunkingLevelConfiguration,
    KnowledgeBaseConfiguration, KnowledgeBaseStorageType, KnowledgeBaseType,
    OpenSearchServerlessConfiguration, OpenSearchServerlessFieldMapping,
    S3DataSourceConfiguration, SemanticChunkingConfiguration, StorageConfiguration,
    VectorIngestionConfiguration, VectorKnowledgeBaseConfiguration,
};
use aws_sdk_bedrockagent::Client as BedrockAgentClient;
use tracing::{debug, info};

use crate::domain::knowledge_base::{
    ChunkingStrategy, CreateKnowledgeBaseRequest, DataSource, DataSourceId, DataSourceSpec,
    DataSourceStatus, DataSourceType, IngestionJob, IngestionJobId, IngestionJobStatus,
    IngestionStatistics, KnowledgeBase, KnowledgeBaseId, KnowledgeBaseManager,
    KnowledgeBaseStatus, VectorStorage,
};
use crate::domain::DomainError;
use crate::infrastructure::aws::error_context;

/// Knowledge base management through the Bedrock Agent API
pub struct BedrockKnowledgeBaseManager {
    client: BedrockAgentClient,
}

impl Debug for BedrockKnowledgeBaseManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BedrockKnowledgeBaseManager").finish()
    }
}

impl BedrockKnowledgeBaseManager {
    /// Create with an existing AWS SDK config
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: BedrockAgentClient::new(sdk_config),
        }
    }
}

fn build_error(what: &str, e: impl std::fmt::Display) -> DomainError {
    DomainError::knowledge_base(format!("Failed to build {}: {}", what, e))
}

fn service_id<T, E>(value: &str, parse: impl FnOnce(String) -> Result<T, E>) -> Result<T, DomainError>
where
    E: std::fmt::Display,
{
    parse(value.to_string()).map_err(|e| {
        DomainError::knowledge_base(format!("Service returned an unexpected identifier: {}", e))
    })
}

fn storage_configuration(storage: &VectorStorage) -> Result<StorageConfiguration, DomainError> {
    match storage {
        VectorStorage::OpensearchServerless {
            collection_arn,
            vector_index_name,
            field_mapping,
        } => {
            let mapping = OpenSearchServerlessFieldMapping::builder()
                .vector_field(&field_mapping.vector_field)
                .text_field(&field_mapping.text_field)
                .metadata_field(&field_mapping.metadata_field)
                .build()
                .map_err(|e| build_error("field mapping", e))?;

            let opensearch = OpenSearchServerlessConfiguration::builder()
                .collection_arn(collection_arn)
                .vector_index_name(vector_index_name)
                .field_mapping(mapping)
                .build()
                .map_err(|e| build_error("OpenSearch Serverless configuration", e))?;

            StorageConfiguration::builder()
                .r#type(KnowledgeBaseStorageType::OpensearchServerless)
                .opensearch_serverless_configuration(opensearch)
                .build()
                .map_err(|e| build_error("storage configuration", e))
        }
    }
}

/// `None` leaves chunking to the service default
fn chunking_configuration(
    strategy: &ChunkingStrategy,
) -> Result<Option<ChunkingConfiguration>, DomainError> {
    let builder = match strategy {
        ChunkingStrategy::ServiceDefault => return Ok(None),
        ChunkingStrategy::None => {
            ChunkingConfiguration::builder().chunking_strategy(SdkChunkingStrategy::None)
        }
        ChunkingStrategy::FixedSize {
            max_tokens,
            overlap_percentage,
        } => ChunkingConfiguration::builder()
            .chunking_strategy(SdkChunkingStrategy::FixedSize)
            .fixed_size_chunking_configuration(
                FixedSizeChunkingConfiguration::builder()
                    .max_tokens(*max_tokens)
                    .overlap_percentage(*overlap_percentage)
                    .build()
                    .map_err(|e| build_error("fixed-size chunking", e))?,
            ),
        ChunkingStrategy::Hierarchical {
            parent_max_tokens,
            child_max_tokens,
            overlap_tokens,
        } => {
            let parent = HierarchicalChunkingLevelConfiguration::builder()
                .max_tokens(*parent_max_tokens)
                .build()
                .map_err(|e| build_error("hierarchical parent level", e))?;
            let child = HierarchicalChunkingLevelConfiguration::builder()
                .max_tokens(*child_max_tokens)
                .build()
                .map_err(|e| build_error("hierarchical child level", e))?;

            ChunkingConfiguration::builder()
                .chunking_strategy(SdkChunkingStrategy::Hierarchical)
                .hierarchical_chunking_configuration(
                    HierarchicalChunkingConfiguration::builder()
                        .level_configurations(parent)
                        .level_configurations(child)
                        .overlap_tokens(*overlap_tokens)
                        .build()
                        .map_err(|e| build_error("hierarchical chunking", e))?,
                )
        }
        ChunkingStrategy::Semantic {
            max_tokens,
            buffer_size,
            breakpoint_percentile_threshold,
        } => ChunkingConfiguration::builder()
            .chunking_strategy(SdkChunkingStrategy::Semantic)
            .semantic_chunking_configuration(
                SemanticChunkingConfiguration::builder()
                    .max_tokens(*max_tokens)
                    .buffer_size(*buffer_size)
                    .breakpoint_percentile_threshold(*breakpoint_percentile_threshold)
                    .build()
                    .map_err(|e| build_error("semantic chunking", e))?,
            ),
    };

    builder
        .build()
        .map(Some)
        .map_err(|e| build_error("chunking configuration", e))
}

fn data_source_configuration(spec: &DataSourceSpec) -> Result<DataSourceConfiguration, DomainError> {
    match spec.source_type {
        DataSourceType::S3 => {
            let s3 = S3DataSourceConfiguration::builder()
                .bucket_arn(spec.bucket_arn())
                .build()
                .map_err(|e| build_error("S3 data source configuration", e))?;

            DataSourceConfiguration::builder()
                .r#type(SdkDataSourceType::S3)
                .s3_configuration(s3)
                .build()
                .map_err(|e| build_error("data source configuration", e))
        }
    }
}

fn ingestion_job_from(job: &aws_sdk_bedrockagent::types::IngestionJob) -> Result<IngestionJob, DomainError> {
    let mut result = IngestionJob::new(
        service_id(job.ingestion_job_id(), IngestionJobId::new)?,
        service_id(job.knowledge_base_id(), KnowledgeBaseId::new)?,
        service_id(job.data_source_id(), DataSourceId::new)?,
        IngestionJobStatus::from_service(job.status().as_str()),
    )
    .with_failure_reasons(job.failure_reasons().to_vec());

    if let Some(stats) = job.statistics() {
        result = result.with_statistics(IngestionStatistics {
            documents_scanned: stats.number_of_documents_scanned(),
            new_documents_indexed: stats.number_of_new_documents_indexed(),
            modified_documents_indexed: stats.number_of_modified_documents_indexed(),
            documents_deleted: stats.number_of_documents_deleted(),
            documents_failed: stats.number_of_documents_failed(),
        });
    }

    Ok(result)
}

fn knowledge_base_from(
    kb: &aws_sdk_bedrockagent::types::KnowledgeBase,
) -> Result<KnowledgeBase, DomainError> {
    let mut result = KnowledgeBase::new(
        service_id(kb.knowledge_base_id(), KnowledgeBaseId::new)?,
        kb.name(),
        KnowledgeBaseStatus::from_service(kb.status().as_str()),
    )
    .with_arn(kb.knowledge_base_arn())
    .with_failure_reasons(kb.failure_reasons().to_vec());

    if let Some(description) = kb.description() {
        result = result.with_description(description);
    }

    Ok(result)
}

#[async_trait]
impl KnowledgeBaseManager for BedrockKnowledgeBaseManager {
    async fn create_knowledge_base(
        &self,
        request: CreateKnowledgeBaseRequest,
    ) -> Result<KnowledgeBase, DomainError> {
        request.validate()?;

        let vector_config = VectorKnowledgeBaseConfiguration::builder()
            .embedding_model_arn(&request.embedding_model_arn)
            .build()
            .map_err(|e| build_error("vector knowledge base configuration", e))?;

        let kb_config = KnowledgeBaseConfiguration::builder()
            .r#type(KnowledgeBaseType::Vector)
            .vector_knowledge_base_configuration(vector_config)
            .build()
            .map_err(|e| build_error("knowledge base configuration", e))?;

        let response = self
            .client
            .create_knowledge_base()
            .name(&request.name)
            .set_description(request.description.clone())
            .role_arn(&request.role_arn)
            .knowledge_base_configuration(kb_config)
            .storage_configuration(storage_configuration(&request.storage)?)
            .send()
            .await
            .map_err(|e| {
                DomainError::knowledge_base(format!(
                    "CreateKnowledgeBase '{}' failed: {}",
                    request.name,
                    error_context(e)
                ))
            })?;

        let kb = response.knowledge_base().ok_or_else(|| {
            DomainError::knowledge_base("CreateKnowledgeBase returned no knowledge base")
        })?;

        let knowledge_base = knowledge_base_from(kb)?;
        info!(
            kb_id = %knowledge_base.id,
            name = %knowledge_base.name,
            status = %knowledge_base.status,
            "Knowledge base created"
        );

        Ok(knowledge_base)
    }

    async fn get_knowledge_base(&self, id: &KnowledgeBaseId) -> Result<KnowledgeBase, DomainError> {
        let response = self
            .client
            .get_knowledge_base()
            .knowledge_base_id(id.as_str())
            .send()
            .await
            .map_err(|e| {
                DomainError::knowledge_base(format!(
                    "GetKnowledgeBase {} failed: {}",
                    id,
                    error_context(e)
                ))
            })?;

        let kb = response.knowledge_base().ok_or_else(|| {
            DomainError::not_found(format!("Knowledge base {} not found", id))
        })?;

        knowledge_base_from(kb)
    }

    async fn create_data_source(
        &self,
        knowledge_base_id: &KnowledgeBaseId,
        spec: DataSourceSpec,
    ) -> Result<DataSource, DomainError> {
        spec.validate()?;

        let mut request = self
            .client
            .create_data_source()
            .knowledge_base_id(knowledge_base_id.as_str())
            .name(&spec.name)
            .data_source_configuration(data_source_configuration(&spec)?);

        if let Some(chunking) = chunking_configuration(&spec.chunking)? {
            request = request.vector_ingestion_configuration(
                VectorIngestionConfiguration::builder()
                    .chunking_configuration(chunking)
                    .build(),
            );
        }

        let response = request.send().await.map_err(|e| {
            DomainError::knowledge_base(format!(
                "CreateDataSource '{}' on knowledge base {} failed: {}",
                spec.name,
                knowledge_base_id,
                error_context(e)
            ))
        })?;

        let ds = response.data_source().ok_or_else(|| {
            DomainError::knowledge_base("CreateDataSource returned no data source")
        })?;

        let data_source = DataSource {
            id: service_id(ds.data_source_id(), DataSourceId::new)?,
            knowledge_base_id: knowledge_base_id.clone(),
            name: ds.name().to_string(),
            status: DataSourceStatus::from_service(ds.status().as_str()),
        };

        info!(
            kb_id = %knowledge_base_id,
            data_source_id = %data_source.id,
            bucket = %spec.bucket_name,
            chunking = %spec.chunking,
            "Data source created"
        );

        Ok(data_source)
    }

    async fn list_data_sources(
        &self,
        knowledge_base_id: &KnowledgeBaseId,
    ) -> Result<Vec<DataSource>, DomainError> {
        let mut data_sources = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let response = self
                .client
                .list_data_sources()
                .knowledge_base_id(knowledge_base_id.as_str())
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| {
                    DomainError::knowledge_base(format!(
                        "ListDataSources on knowledge base {} failed: {}",
                        knowledge_base_id,
                        error_context(e)
                    ))
                })?;

            for summary in response.data_source_summaries() {
                data_sources.push(DataSource {
                    id: service_id(summary.data_source_id(), DataSourceId::new)?,
                    knowledge_base_id: knowledge_base_id.clone(),
                    name: summary.name().to_string(),
                    status: DataSourceStatus::from_service(summary.status().as_str()),
                });
            }

            match response.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        debug!(
            kb_id = %knowledge_base_id,
            count = data_sources.len(),
            "Data sources listed"
        );

        Ok(data_sources)
    }

    async fn start_ingestion_job(
        &self,
        knowledge_base_id: &KnowledgeBaseId,
        data_source_id: &DataSourceId,
    ) -> Result<IngestionJob, DomainError> {
        let response = self
            .client
            .start_ingestion_job()
            .knowledge_base_id(knowledge_base_id.as_str())
            .data_source_id(data_source_id.as_str())
            .send()
            .await
            .map_err(|e| {
                DomainError::knowledge_base(format!(
                    "StartIngestionJob for data source {} failed: {}",
                    data_source_id,
                    error_context(e)
                ))
            })?;

        let job = response.ingestion_job().ok_or_else(|| {
            DomainError::knowledge_base("StartIngestionJob returned no ingestion job")
        })?;

        ingestion_job_from(job)
    }

    async fn get_ingestion_job(
        &self,
        knowledge_base_id: &KnowledgeBaseId,
        data_source_id: &DataSourceId,
        job_id: &IngestionJobId,
    ) -> Result<IngestionJob, DomainError> {
        let response = self
            .client
            .get_ingestion_job()
            .knowledge_base_id(knowledge_base_id.as_str())
            .data_source_id(data_source_id.as_str())
            .ingestion_job_id(job_id.as_str())
            .send()
            .await
            .map_err(|e| {
                DomainError::knowledge_base(format!(
                    "GetIngestionJob {} failed: {}",
                    job_id,
                    error_context(e)
                ))
            })?;

        let job = response.ingestion_job().ok_or_else(|| {
            DomainError::not_found(format!("Ingestion job {} not found", job_id))
        })?;

        ingestion_job_from(job)
    }
}
