//! Query service - retrieval and retrieve-and-generate against a knowledge base

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::knowledge_base::{
    GenerateRequest, GenerationResult, KnowledgeBaseRuntime, RetrievalPage, RetrieveRequest,
};
use crate::domain::DomainError;

/// Thin pass-through to the knowledge base runtime
pub struct QueryService {
    runtime: Arc<dyn KnowledgeBaseRuntime>,
}

impl std::fmt::Debug for QueryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryService").finish()
    }
}

impl QueryService {
    pub fn new(runtime: Arc<dyn KnowledgeBaseRuntime>) -> Self {
        Self { runtime }
    }

    /// Retrieve one page of chunks, in the order the service ranked them
    pub async fn retrieve(&self, request: RetrieveRequest) -> Result<RetrievalPage, DomainError> {
        request.validate()?;

        let limit = request.number_of_results as usize;
        let kb_id = request.knowledge_base_id.clone();
        let mut page = self.runtime.retrieve(request).await?;

        if page.chunks.len() > limit {
            debug!(
                kb_id = %kb_id,
                returned = page.chunks.len(),
                limit,
                "Truncating chunks to requested limit"
            );
            page.chunks.truncate(limit);
        }

        info!(kb_id = %kb_id, chunks = page.chunks.len(), "Retrieved chunks");
        Ok(page)
    }

    /// Follow pagination tokens for at most `max_pages` pages, concatenating chunks in order.
    ///
    /// The returned page carries the next token when the cap stopped the walk.
    pub async fn retrieve_all_pages(
        &self,
        request: RetrieveRequest,
        max_pages: u32,
    ) -> Result<RetrievalPage, DomainError> {
        let mut combined = RetrievalPage::default();
        let mut next_request = Some(request);
        let mut pages = 0;

        while let Some(request) = next_request.take() {
            if pages >= max_pages {
                combined.next_token = request.next_token;
                break;
            }

            let template = request.clone();
            let page = self.retrieve(request).await?;
            pages += 1;

            combined.chunks.extend(page.chunks);
            combined.next_token = None;

            if let Some(token) = page.next_token {
                next_request = Some(template.with_next_token(token));
            }
        }

        debug!(pages, chunks = combined.chunks.len(), "Retrieval pages collected");
        Ok(combined)
    }

    /// Retrieve and synthesize an answer.
    ///
    /// A custom template missing the required placeholders is logged and sent unchanged.
    pub async fn generate(&self, request: GenerateRequest) -> Result<GenerationResult, DomainError> {
        request.validate()?;

        if let Some(template) = &request.prompt_template {
            let missing = template.missing_placeholders();
            if !missing.is_empty() {
                warn!(
                    kb_id = %request.knowledge_base_id,
                    missing = ?missing,
                    found = ?template.placeholders(),
                    "Prompt template is missing placeholders"
                );
            }
        }

        let kb_id = request.knowledge_base_id.clone();
        let result = self.runtime.retrieve_and_generate(request).await?;

        info!(
            kb_id = %kb_id,
            citations = result.citations.len(),
            "Generated answer"
        );

        Ok(result)
    }
}
