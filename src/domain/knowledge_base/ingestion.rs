//! Ingestion (sync) jobs and the polling policy used to wait on them

use std::time::Duration;

use serde::Serialize;

use super::entity::{DataSourceId, IngestionJobId, KnowledgeBaseId};

/// Status of an ingestion job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum IngestionJobStatus {
    Starting,
    InProgress,
    Complete,
    Failed,
    Stopping,
    Stopped,
    Unknown(String),
}

impl IngestionJobStatus {
    pub fn from_service(value: &str) -> Self {
        match value {
            "STARTING" => Self::Starting,
            "IN_PROGRESS" => Self::InProgress,
            "COMPLETE" => Self::Complete,
            "FAILED" => Self::Failed,
            "STOPPING" => Self::Stopping,
            "STOPPED" => Self::Stopped,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Terminal states: the job will not change any more
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed | Self::Stopped)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

impl std::fmt::Display for IngestionJobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Starting => write!(f, "STARTING"),
            Self::InProgress => write!(f, "IN_PROGRESS"),
            Self::Complete => write!(f, "COMPLETE"),
            Self::Failed => write!(f, "FAILED"),
            Self::Stopping => write!(f, "STOPPING"),
            Self::Stopped => write!(f, "STOPPED"),
            Self::Unknown(s) => write!(f, "{}", s),
        }
    }
}

/// Document counters reported for an ingestion job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestionStatistics {
    pub documents_scanned: i64,
    pub new_documents_indexed: i64,
    pub modified_documents_indexed: i64,
    pub documents_deleted: i64,
    pub documents_failed: i64,
}

/// An ingestion job as reported by the service
#[derive(Debug, Clone, Serialize)]
pub struct IngestionJob {
    pub id: IngestionJobId,
    pub knowledge_base_id: KnowledgeBaseId,
    pub data_source_id: DataSourceId,
    pub status: IngestionJobStatus,
    pub statistics: Option<IngestionStatistics>,
    pub failure_reasons: Vec<String>,
}

impl IngestionJob {
    pub fn new(
        id: IngestionJobId,
        knowledge_base_id: KnowledgeBaseId,
        data_source_id: DataSourceId,
        status: IngestionJobStatus,
    ) -> Self {
        Self {
            id,
            knowledge_base_id,
            data_source_id,
            status,
            statistics: None,
            failure_reasons: Vec::new(),
        }
    }

    pub fn with_statistics(mut self, statistics: IngestionStatistics) -> Self {
        self.statistics = Some(statistics);
        self
    }

    pub fn with_failure_reasons(mut self, reasons: Vec<String>) -> Self {
        self.failure_reasons = reasons;
        self
    }
}

/// Bounded exponential backoff for status polling
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: u32,
    /// Number of status reads before giving up
    pub max_attempts: u32,
}

impl PollPolicy {
    pub fn new(initial_delay: Duration, max_delay: Duration, multiplier: u32, max_attempts: u32) -> Self {
        Self {
            initial_delay,
            max_delay,
            multiplier,
            max_attempts,
        }
    }

    /// Delay before the status read following `attempt` (0-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.max(1).saturating_pow(attempt);
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Upper bound on the total time spent sleeping
    pub fn max_total_wait(&self) -> Duration {
        (0..self.max_attempts.saturating_sub(1))
            .map(|attempt| self.delay_for(attempt))
            .sum()
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(60),
            multiplier: 2,
            max_attempts: 40,
        }
    }
}
