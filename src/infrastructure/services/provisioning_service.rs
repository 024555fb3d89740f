//! Knowledge base provisioning and ingestion service

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::knowledge_base::{
    CreateKnowledgeBaseRequest, DataSource, DataSourceId, DataSourceSpec, IngestionJob,
    KnowledgeBase, KnowledgeBaseId, KnowledgeBaseManager, KnowledgeBaseStatus, PollPolicy,
};
use crate::domain::DomainError;

/// Knowledge base to create together with its data sources
#[derive(Debug, Clone)]
pub struct ProvisionRequest {
    pub knowledge_base: CreateKnowledgeBaseRequest,
    pub data_sources: Vec<DataSourceSpec>,
}

/// An active knowledge base and the data sources created for it
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionedKnowledgeBase {
    pub knowledge_base: KnowledgeBase,
    pub data_sources: Vec<DataSource>,
}

/// Creates knowledge bases and drives ingestion jobs to completion
pub struct KnowledgeBaseProvisioner {
    manager: Arc<dyn KnowledgeBaseManager>,
    poll_policy: PollPolicy,
}

impl std::fmt::Debug for KnowledgeBaseProvisioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeBaseProvisioner")
            .field("poll_policy", &self.poll_policy)
            .finish()
    }
}

impl KnowledgeBaseProvisioner {
    pub fn new(manager: Arc<dyn KnowledgeBaseManager>, poll_policy: PollPolicy) -> Self {
        Self {
            manager,
            poll_policy,
        }
    }

    /// Create the knowledge base, wait until it is active, then attach its data sources
    pub async fn provision(
        &self,
        request: ProvisionRequest,
    ) -> Result<ProvisionedKnowledgeBase, DomainError> {
        request.knowledge_base.validate()?;
        for spec in &request.data_sources {
            spec.validate()?;
        }

        let created = self
            .manager
            .create_knowledge_base(request.knowledge_base)
            .await?;
        info!(kb_id = %created.id, name = %created.name, "Knowledge base requested");

        let knowledge_base = self.wait_for_active(&created.id).await?;

        let mut data_sources = Vec::with_capacity(request.data_sources.len());
        for spec in request.data_sources {
            let data_source = self
                .manager
                .create_data_source(&knowledge_base.id, spec)
                .await?;
            data_sources.push(data_source);
        }

        info!(
            kb_id = %knowledge_base.id,
            data_sources = data_sources.len(),
            "Knowledge base provisioned"
        );

        Ok(ProvisionedKnowledgeBase {
            knowledge_base,
            data_sources,
        })
    }

    /// Poll until the knowledge base reports `Active`
    pub async fn wait_for_active(&self, id: &KnowledgeBaseId) -> Result<KnowledgeBase, DomainError> {
        debug!(
            kb_id = %id,
            max_wait_secs = self.poll_policy.max_total_wait().as_secs(),
            "Waiting for knowledge base to become active"
        );

        for attempt in 0..self.poll_policy.max_attempts {
            let knowledge_base = self.manager.get_knowledge_base(id).await?;
            debug!(kb_id = %id, status = %knowledge_base.status, attempt, "Knowledge base status");

            match knowledge_base.status {
                KnowledgeBaseStatus::Active => return Ok(knowledge_base),
                KnowledgeBaseStatus::Failed | KnowledgeBaseStatus::DeleteUnsuccessful => {
                    return Err(DomainError::knowledge_base(format!(
                        "Knowledge base {} ended in status {}: {}",
                        id,
                        knowledge_base.status,
                        knowledge_base.failure_reasons.join("; ")
                    )));
                }
                _ => {}
            }

            self.pause(attempt).await;
        }

        Err(DomainError::timeout(format!(
            "knowledge base {} did not become active after {} status checks",
            id, self.poll_policy.max_attempts
        )))
    }

    /// Start one ingestion job for a data source
    pub async fn start_ingestion(
        &self,
        knowledge_base_id: &KnowledgeBaseId,
        data_source_id: &DataSourceId,
    ) -> Result<IngestionJob, DomainError> {
        let job = self
            .manager
            .start_ingestion_job(knowledge_base_id, data_source_id)
            .await?;

        info!(
            kb_id = %knowledge_base_id,
            data_source_id = %data_source_id,
            job_id = %job.id,
            status = %job.status,
            "Ingestion job started"
        );

        Ok(job)
    }

    /// Start an ingestion job for every data source of the knowledge base
    pub async fn sync(&self, knowledge_base_id: &KnowledgeBaseId) -> Result<Vec<IngestionJob>, DomainError> {
        let data_sources = self.manager.list_data_sources(knowledge_base_id).await?;

        if data_sources.is_empty() {
            return Err(DomainError::not_found(format!(
                "Knowledge base {} has no data sources",
                knowledge_base_id
            )));
        }

        let mut jobs = Vec::with_capacity(data_sources.len());
        for data_source in &data_sources {
            jobs.push(self.start_ingestion(knowledge_base_id, &data_source.id).await?);
        }

        Ok(jobs)
    }

    /// Poll a job until it reaches a terminal status.
    ///
    /// Failed and stopped jobs are returned, not raised; only an exhausted
    /// poll budget is an error.
    pub async fn wait_for_ingestion(&self, job: &IngestionJob) -> Result<IngestionJob, DomainError> {
        debug!(
            job_id = %job.id,
            max_wait_secs = self.poll_policy.max_total_wait().as_secs(),
            "Waiting for ingestion job"
        );

        for attempt in 0..self.poll_policy.max_attempts {
            let current = self
                .manager
                .get_ingestion_job(&job.knowledge_base_id, &job.data_source_id, &job.id)
                .await?;

            debug!(job_id = %current.id, status = %current.status, attempt, "Ingestion job status");

            if current.status.is_terminal() {
                if current.status.is_success() {
                    info!(
                        kb_id = %current.knowledge_base_id,
                        job_id = %current.id,
                        status = %current.status,
                        "Ingestion job finished"
                    );
                } else {
                    warn!(
                        kb_id = %current.knowledge_base_id,
                        job_id = %current.id,
                        status = %current.status,
                        reasons = ?current.failure_reasons,
                        "Ingestion job did not complete"
                    );
                }
                return Ok(current);
            }

            self.pause(attempt).await;
        }

        Err(DomainError::timeout(format!(
            "ingestion job {} still running after {} status checks",
            job.id, self.poll_policy.max_attempts
        )))
    }

    /// Wait for each job in turn
    pub async fn wait_for_all(&self, jobs: &[IngestionJob]) -> Result<Vec<IngestionJob>, DomainError> {
        let mut finished = Vec::with_capacity(jobs.len());
        for job in jobs {
            finished.push(self.wait_for_ingestion(job).await?);
        }
        Ok(finished)
    }

    /// Fail on the first job that ended in a terminal status other than `Complete`.
    ///
    /// Jobs still running (for example when waiting was skipped) pass.
    pub fn ensure_completed(jobs: &[IngestionJob]) -> Result<(), DomainError> {
        match jobs
            .iter()
            .find(|job| job.status.is_terminal() && !job.status.is_success())
        {
            Some(job) => {
                let mut message = format!("ended in status {}", job.status);
                if !job.failure_reasons.is_empty() {
                    message.push_str(": ");
                    message.push_str(&job.failure_reasons.join("; "));
                }
                Err(DomainError::ingestion(job.id.to_string(), message))
            }
            None => Ok(()),
        }
    }

    // No sleep after the final status read
    async fn pause(&self, attempt: u32) {
        if attempt + 1 < self.poll_policy.max_attempts {
            tokio::time::sleep(self.poll_policy.delay_for(attempt)).await;
        }
    }
}
