//! Knowledge base service traits
//!
//! `KnowledgeBaseManager` covers the control plane (create, inspect, sync) and
//! `KnowledgeBaseRuntime` the query plane (retrieve, retrieve-and-generate).
//! Implementations translate between these types and a concrete backend.

use std::fmt::Debug;

use async_trait::async_trait;

use super::entity::{
    CreateKnowledgeBaseRequest, DataSource, DataSourceId, DataSourceSpec, IngestionJobId,
    KnowledgeBase, KnowledgeBaseId,
};
use super::generation::{GenerateRequest, GenerationResult};
use super::ingestion::IngestionJob;
use super::retrieval::{RetrievalPage, RetrieveRequest};
use crate::domain::error::DomainError;

/// Control-plane operations on knowledge bases
#[async_trait]
pub trait KnowledgeBaseManager: Send + Sync + Debug {
    /// Create a vector knowledge base; the service assigns its ID
    async fn create_knowledge_base(
        &self,
        request: CreateKnowledgeBaseRequest,
    ) -> Result<KnowledgeBase, DomainError>;

    /// Fetch the current state of a knowledge base
    async fn get_knowledge_base(&self, id: &KnowledgeBaseId) -> Result<KnowledgeBase, DomainError>;

    /// Register a data source with a knowledge base
    async fn create_data_source(
        &self,
        knowledge_base_id: &KnowledgeBaseId,
        spec: DataSourceSpec,
    ) -> Result<DataSource, DomainError>;

    /// List the data sources of a knowledge base
    async fn list_data_sources(
        &self,
        knowledge_base_id: &KnowledgeBaseId,
    ) -> Result<Vec<DataSource>, DomainError>;

    /// Start scanning, chunking, embedding and indexing a data source
    async fn start_ingestion_job(
        &self,
        knowledge_base_id: &KnowledgeBaseId,
        data_source_id: &DataSourceId,
    ) -> Result<IngestionJob, DomainError>;

    /// Fetch the current state of an ingestion job
    async fn get_ingestion_job(
        &self,
        knowledge_base_id: &KnowledgeBaseId,
        data_source_id: &DataSourceId,
        job_id: &IngestionJobId,
    ) -> Result<IngestionJob, DomainError>;
}

/// Query-plane operations on an existing knowledge base
#[async_trait]
pub trait KnowledgeBaseRuntime: Send + Sync + Debug {
    /// Similarity search returning one page of chunks in service order
    async fn retrieve(&self, request: RetrieveRequest) -> Result<RetrievalPage, DomainError>;

    /// Retrieve relevant chunks and synthesize an answer with citations
    async fn retrieve_and_generate(
        &self,
        request: GenerateRequest,
    ) -> Result<GenerationResult, DomainError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use crate::domain::knowledge_base::{
        DataSourceStatus, IngestionJobStatus, KnowledgeBaseStatus,
    };

    /// Mock runtime returning canned pages and answers, recording every request
    #[derive(Debug, Default)]
    pub struct MockKnowledgeBaseRuntime {
        pages: Mutex<VecDeque<RetrievalPage>>,
        generation: Mutex<Option<GenerationResult>>,
        retrieve_requests: Mutex<Vec<RetrieveRequest>>,
        generate_requests: Mutex<Vec<GenerateRequest>>,
        should_fail: Mutex<bool>,
    }

    impl MockKnowledgeBaseRuntime {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue a page; pages are returned in the order they were added
        pub fn with_page(self, page: RetrievalPage) -> Self {
            self.pages.lock().unwrap().push_back(page);
            self
        }

        pub fn with_generation(self, result: GenerationResult) -> Self {
            *self.generation.lock().unwrap() = Some(result);
            self
        }

        pub fn failing(self) -> Self {
            *self.should_fail.lock().unwrap() = true;
            self
        }

        pub fn retrieve_requests(&self) -> Vec<RetrieveRequest> {
            self.retrieve_requests.lock().unwrap().clone()
        }

        pub fn generate_requests(&self) -> Vec<GenerateRequest> {
            self.generate_requests.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.retrieve_requests.lock().unwrap().len()
                + self.generate_requests.lock().unwrap().len()
        }

        fn check_should_fail(&self) -> Result<(), DomainError> {
            if *self.should_fail.lock().unwrap() {
                return Err(DomainError::knowledge_base(
                    "Mock runtime configured to fail",
                ));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl KnowledgeBaseRuntime for MockKnowledgeBaseRuntime {
        async fn retrieve(&self, request: RetrieveRequest) -> Result<RetrievalPage, DomainError> {
            self.retrieve_requests.lock().unwrap().push(request.clone());
            self.check_should_fail()?;

            let page = self.pages.lock().unwrap().pop_front().unwrap_or_default();
            let mut chunks = page.chunks;
            chunks.truncate(request.number_of_results as usize);

            Ok(RetrievalPage {
                chunks,
                next_token: page.next_token,
            })
        }

        async fn retrieve_and_generate(
            &self,
            request: GenerateRequest,
        ) -> Result<GenerationResult, DomainError> {
            self.generate_requests.lock().unwrap().push(request);
            self.check_should_fail()?;

            Ok(self
                .generation
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_default())
        }
    }

    /// Mock control plane with scripted status sequences
    #[derive(Debug)]
    pub struct MockKnowledgeBaseManager {
        knowledge_base_id: KnowledgeBaseId,
        kb_statuses: Mutex<VecDeque<KnowledgeBaseStatus>>,
        job_statuses: Mutex<VecDeque<IngestionJobStatus>>,
        data_sources: Mutex<Vec<DataSource>>,
        created_specs: Mutex<Vec<DataSourceSpec>>,
        started_jobs: Mutex<Vec<DataSourceId>>,
        job_polls: Mutex<usize>,
        kb_polls: Mutex<usize>,
        next_data_source: Mutex<usize>,
    }

    impl MockKnowledgeBaseManager {
        pub fn new(knowledge_base_id: KnowledgeBaseId) -> Self {
            Self {
                knowledge_base_id,
                kb_statuses: Mutex::new(VecDeque::new()),
                job_statuses: Mutex::new(VecDeque::new()),
                data_sources: Mutex::new(Vec::new()),
                created_specs: Mutex::new(Vec::new()),
                started_jobs: Mutex::new(Vec::new()),
                job_polls: Mutex::new(0),
                kb_polls: Mutex::new(0),
                next_data_source: Mutex::new(0),
            }
        }

        /// Statuses returned by successive `get_knowledge_base` calls; the last one repeats
        pub fn with_kb_statuses(self, statuses: Vec<KnowledgeBaseStatus>) -> Self {
            *self.kb_statuses.lock().unwrap() = statuses.into();
            self
        }

        /// Statuses returned by successive `get_ingestion_job` calls; the last one repeats
        pub fn with_job_statuses(self, statuses: Vec<IngestionJobStatus>) -> Self {
            *self.job_statuses.lock().unwrap() = statuses.into();
            self
        }

        pub fn with_data_source(self, id: &str, name: &str) -> Self {
            self.data_sources.lock().unwrap().push(DataSource {
                id: DataSourceId::new(id).unwrap(),
                knowledge_base_id: self.knowledge_base_id.clone(),
                name: name.to_string(),
                status: DataSourceStatus::Available,
            });
            self
        }

        pub fn created_specs(&self) -> Vec<DataSourceSpec> {
            self.created_specs.lock().unwrap().clone()
        }

        pub fn started_jobs(&self) -> Vec<DataSourceId> {
            self.started_jobs.lock().unwrap().clone()
        }

        pub fn job_polls(&self) -> usize {
            *self.job_polls.lock().unwrap()
        }

        pub fn kb_polls(&self) -> usize {
            *self.kb_polls.lock().unwrap()
        }

        fn next_status<T: Clone>(queue: &Mutex<VecDeque<T>>, fallback: T) -> T {
            let mut queue = queue.lock().unwrap();
            if queue.len() > 1 {
                queue.pop_front().unwrap_or(fallback)
            } else {
                queue.front().cloned().unwrap_or(fallback)
            }
        }

        fn job(&self, data_source_id: &DataSourceId, status: IngestionJobStatus) -> IngestionJob {
            IngestionJob::new(
                IngestionJobId::new("JOB0000001").unwrap(),
                self.knowledge_base_id.clone(),
                data_source_id.clone(),
                status,
            )
        }
    }

    #[async_trait]
    impl KnowledgeBaseManager for MockKnowledgeBaseManager {
        async fn create_knowledge_base(
            &self,
            request: CreateKnowledgeBaseRequest,
        ) -> Result<KnowledgeBase, DomainError> {
            Ok(KnowledgeBase::new(
                self.knowledge_base_id.clone(),
                request.name,
                KnowledgeBaseStatus::Creating,
            ))
        }

        async fn get_knowledge_base(
            &self,
            id: &KnowledgeBaseId,
        ) -> Result<KnowledgeBase, DomainError> {
            *self.kb_polls.lock().unwrap() += 1;
            let status = Self::next_status(&self.kb_statuses, KnowledgeBaseStatus::Active);
            Ok(KnowledgeBase::new(id.clone(), "mock", status))
        }

        async fn create_data_source(
            &self,
            knowledge_base_id: &KnowledgeBaseId,
            spec: DataSourceSpec,
        ) -> Result<DataSource, DomainError> {
            let mut counter = self.next_data_source.lock().unwrap();
            *counter += 1;

            let data_source = DataSource {
                id: DataSourceId::new(format!("DS{:08}", *counter)).unwrap(),
                knowledge_base_id: knowledge_base_id.clone(),
                name: spec.name.clone(),
                status: DataSourceStatus::Available,
            };

            self.created_specs.lock().unwrap().push(spec);
            self.data_sources.lock().unwrap().push(data_source.clone());
            Ok(data_source)
        }

        async fn list_data_sources(
            &self,
            _knowledge_base_id: &KnowledgeBaseId,
        ) -> Result<Vec<DataSource>, DomainError> {
            Ok(self.data_sources.lock().unwrap().clone())
        }

        async fn start_ingestion_job(
            &self,
            _knowledge_base_id: &KnowledgeBaseId,
            data_source_id: &DataSourceId,
        ) -> Result<IngestionJob, DomainError> {
            self.started_jobs.lock().unwrap().push(data_source_id.clone());
            Ok(self.job(data_source_id, IngestionJobStatus::Starting))
        }

        async fn get_ingestion_job(
            &self,
            _knowledge_base_id: &KnowledgeBaseId,
            data_source_id: &DataSourceId,
            _job_id: &IngestionJobId,
        ) -> Result<IngestionJob, DomainError> {
            *self.job_polls.lock().unwrap() += 1;
            let status = Self::next_status(&self.job_statuses, IngestionJobStatus::Complete);
            Ok(self.job(data_source_id, status))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::domain::knowledge_base::RetrievedChunk;

        #[tokio::test]
        async fn test_mock_runtime_truncates_to_limit() {
            let runtime = MockKnowledgeBaseRuntime::new().with_page(RetrievalPage::new(vec![
                RetrievedChunk::new("a"),
                RetrievedChunk::new("b"),
                RetrievedChunk::new("c"),
            ]));

            let request = RetrieveRequest::new(KnowledgeBaseId::new("ABCDE12345").unwrap(), "q")
                .with_number_of_results(2);
            let page = runtime.retrieve(request).await.unwrap();

            assert_eq!(page.chunks.len(), 2);
            assert_eq!(runtime.call_count(), 1);
        }

        #[tokio::test]
        async fn test_mock_manager_status_sequence_repeats_last() {
            let id = KnowledgeBaseId::new("ABCDE12345").unwrap();
            let manager = MockKnowledgeBaseManager::new(id.clone()).with_kb_statuses(vec![
                KnowledgeBaseStatus::Creating,
                KnowledgeBaseStatus::Active,
            ]);

            assert_eq!(
                manager.get_knowledge_base(&id).await.unwrap().status,
                KnowledgeBaseStatus::Creating
            );
            assert_eq!(
                manager.get_knowledge_base(&id).await.unwrap().status,
                KnowledgeBaseStatus::Active
            );
            assert_eq!(
                manager.get_knowledge_base(&id).await.unwrap().status,
                KnowledgeBaseStatus::Active
            );
            assert_eq!(manager.kb_polls(), 3);
        }
    }
}
