//! AWS Bedrock Agent Runtime implementation of retrieval and generation

use std::fmt::Debug;

use async_trait::async_trait;
use aws_sdk_bedrockagentruntime::types::{
    GenerationConfiguration, KnowledgeBaseQuery, KnowledgeBaseRetrievalConfiguration,
    KnowledgeBaseRetrievalResult, KnowledgeBaseRetrieveAndGenerateConfiguration,
    KnowledgeBaseVectorSearchConfiguration, PromptTemplate as SdkPromptTemplate,
    RetrievalResultLocation, RetrieveAndGenerateConfiguration, RetrieveAndGenerateInput,
    RetrieveAndGenerateType,
};
use aws_sdk_bedrockagentruntime::Client as BedrockAgentRuntimeClient;
use tracing::{debug, warn};

use super::document::metadata_to_json;
use crate::domain::knowledge_base::{
    ChunkLocation, Citation, GenerateRequest, GenerationResult, KnowledgeBaseRuntime,
    RetrievalPage, RetrieveRequest, RetrievedChunk, RetrievedReference,
};
use crate::domain::DomainError;
use crate::infrastructure::aws::error_context;

/// Knowledge base queries through the Bedrock Agent Runtime API
pub struct BedrockKnowledgeBaseRuntime {
    client: BedrockAgentRuntimeClient,
}

impl Debug for BedrockKnowledgeBaseRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BedrockKnowledgeBaseRuntime").finish()
    }
}

impl BedrockKnowledgeBaseRuntime {
    /// Create with an existing AWS SDK config
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: BedrockAgentRuntimeClient::new(sdk_config),
        }
    }

    fn retrieval_configuration(number_of_results: u32) -> KnowledgeBaseRetrievalConfiguration {
        let vector_config = KnowledgeBaseVectorSearchConfiguration::builder()
            .number_of_results(number_of_results as i32)
            .build();

        KnowledgeBaseRetrievalConfiguration::builder()
            .vector_search_configuration(vector_config)
            .build()
    }
}

#[async_trait]
impl KnowledgeBaseRuntime for BedrockKnowledgeBaseRuntime {
    async fn retrieve(&self, request: RetrieveRequest) -> Result<RetrievalPage, DomainError> {
        let query = KnowledgeBaseQuery::builder().text(request.query).build();

        let response = self
            .client
            .retrieve()
            .knowledge_base_id(request.knowledge_base_id.as_str())
            .retrieval_query(query)
            .retrieval_configuration(Self::retrieval_configuration(request.number_of_results))
            .set_next_token(request.next_token)
            .send()
            .await
            .map_err(|e| {
                DomainError::knowledge_base(format!(
                    "Retrieve on knowledge base {} failed: {}",
                    request.knowledge_base_id,
                    error_context(e)
                ))
            })?;

        // Service order and count are kept as-is: no re-ranking, filtering or dedup
        let chunks: Vec<RetrievedChunk> = response
            .retrieval_results()
            .iter()
            .enumerate()
            .map(|(index, result)| chunk_from_result(index, result))
            .collect();

        debug!(
            kb_id = %request.knowledge_base_id,
            chunks = chunks.len(),
            has_more = response.next_token().is_some(),
            "Retrieve completed"
        );

        Ok(RetrievalPage {
            chunks,
            next_token: response.next_token().map(str::to_string),
        })
    }

    async fn retrieve_and_generate(
        &self,
        request: GenerateRequest,
    ) -> Result<GenerationResult, DomainError> {
        let mut kb_config = KnowledgeBaseRetrieveAndGenerateConfiguration::builder()
            .knowledge_base_id(request.knowledge_base_id.as_str())
            .model_arn(&request.model_arn)
            .retrieval_configuration(Self::retrieval_configuration(request.number_of_results));

        if let Some(template) = &request.prompt_template {
            let prompt = SdkPromptTemplate::builder()
                .text_prompt_template(template.as_str())
                .build();

            kb_config = kb_config.generation_configuration(
                GenerationConfiguration::builder()
                    .prompt_template(prompt)
                    .build(),
            );
        }

        let kb_config = kb_config.build().map_err(|e| {
            DomainError::knowledge_base(format!(
                "Failed to build knowledge base generation config: {}",
                e
            ))
        })?;

        let configuration = RetrieveAndGenerateConfiguration::builder()
            .r#type(RetrieveAndGenerateType::KnowledgeBase)
            .knowledge_base_configuration(kb_config)
            .build()
            .map_err(|e| {
                DomainError::knowledge_base(format!(
                    "Failed to build retrieve-and-generate config: {}",
                    e
                ))
            })?;

        let input = RetrieveAndGenerateInput::builder()
            .text(request.query)
            .build()
            .map_err(|e| {
                DomainError::knowledge_base(format!("Failed to build generation input: {}", e))
            })?;

        let response = self
            .client
            .retrieve_and_generate()
            .input(input)
            .retrieve_and_generate_configuration(configuration)
            .send()
            .await
            .map_err(|e| {
                DomainError::knowledge_base(format!(
                    "RetrieveAndGenerate on knowledge base {} failed: {}",
                    request.knowledge_base_id,
                    error_context(e)
                ))
            })?;

        let text = match response.output() {
            Some(output) => output.text().to_string(),
            None => {
                warn!(kb_id = %request.knowledge_base_id, "RetrieveAndGenerate returned no output");
                String::new()
            }
        };

        let citations: Vec<Citation> = response
            .citations()
            .iter()
            .map(|c| Citation {
                generated_text: c
                    .generated_response_part()
                    .and_then(|p| p.text_response_part())
                    .and_then(|t| t.text())
                    .map(str::to_string),
                references: c
                    .retrieved_references()
                    .iter()
                    .map(|r| {
                        let content = r.content().map(|c| c.text().to_string()).unwrap_or_default();
                        let mut reference = RetrievedReference::new(content);

                        if let Some(location) = r.location() {
                            reference = reference.with_location(location_from(location));
                        }

                        if let Some(metadata) = r.metadata() {
                            reference = reference.with_all_metadata(metadata_to_json(metadata));
                        }

                        reference
                    })
                    .collect(),
            })
            .collect();

        let mut result = GenerationResult::new(text).with_session_id(response.session_id());
        result.citations = citations;

        Ok(result)
    }
}

fn chunk_from_result(index: usize, result: &KnowledgeBaseRetrievalResult) -> RetrievedChunk {
    let content = match result.content() {
        Some(content) => content.text().to_string(),
        None => {
            warn!(index, "Retrieval result has no text content");
            String::new()
        }
    };
    let mut chunk = RetrievedChunk::new(content);

    if let Some(score) = result.score() {
        chunk = chunk.with_score(score);
    }

    if let Some(location) = result.location() {
        chunk = chunk.with_location(location_from(location));
    }

    if let Some(metadata) = result.metadata() {
        chunk = chunk.with_all_metadata(metadata_to_json(metadata));
    }

    chunk
}

fn location_from(location: &RetrievalResultLocation) -> ChunkLocation {
    let uri = location
        .s3_location()
        .and_then(|s3| s3.uri())
        .or_else(|| location.web_location().and_then(|web| web.url()))
        .map(str::to_string);

    ChunkLocation {
        location_type: location.r#type().as_str().to_string(),
        uri,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_without_content_is_kept() {
        let result = KnowledgeBaseRetrievalResult::builder().score(0.3).build();

        let chunk = chunk_from_result(2, &result);

        assert_eq!(chunk.content, "");
        assert_eq!(chunk.score, Some(0.3));
    }
}
