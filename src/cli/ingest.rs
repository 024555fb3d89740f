//! Ingest command - syncs data sources into a knowledge base

use std::io::Write;
use std::sync::Arc;

use clap::Args;

use super::output::OutputWriter;
use super::parse_id;
use crate::config::AppConfig;
use crate::domain::knowledge_base::{
    DataSourceId, KnowledgeBaseId, KnowledgeBaseManager, PollPolicy,
};
use crate::infrastructure::aws::load_sdk_config;
use crate::infrastructure::knowledge_base::BedrockKnowledgeBaseManager;
use crate::infrastructure::services::KnowledgeBaseProvisioner;

/// Arguments for the ingest command
#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    /// Knowledge base ID
    #[arg(long = "kb-id", alias = "kb_id", value_parser = parse_id::<KnowledgeBaseId>)]
    pub kb_id: KnowledgeBaseId,

    /// Only ingest this data source (all data sources by default)
    #[arg(long, value_parser = parse_id::<DataSourceId>)]
    pub data_source_id: Option<DataSourceId>,

    /// Start the jobs without waiting for them to finish
    #[arg(long)]
    pub no_wait: bool,
}

/// Run the ingest command against Bedrock
pub async fn run(args: IngestArgs, config: &AppConfig, json: bool) -> anyhow::Result<()> {
    let sdk_config = load_sdk_config(&config.aws).await;
    let manager: Arc<dyn KnowledgeBaseManager> =
        Arc::new(BedrockKnowledgeBaseManager::new(&sdk_config));

    execute(
        args,
        manager,
        config.ingestion.poll_policy(),
        &mut OutputWriter::stdout(json),
    )
    .await
}

pub async fn execute<W: Write>(
    args: IngestArgs,
    manager: Arc<dyn KnowledgeBaseManager>,
    poll_policy: PollPolicy,
    output: &mut OutputWriter<W>,
) -> anyhow::Result<()> {
    let provisioner = KnowledgeBaseProvisioner::new(manager, poll_policy);

    let mut jobs = match &args.data_source_id {
        Some(data_source_id) => vec![
            provisioner
                .start_ingestion(&args.kb_id, data_source_id)
                .await?,
        ],
        None => provisioner.sync(&args.kb_id).await?,
    };

    if !args.no_wait {
        jobs = provisioner.wait_for_all(&jobs).await?;
    }

    output.ingestion_jobs(&jobs)?;

    KnowledgeBaseProvisioner::ensure_completed(&jobs)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::knowledge_base::{IngestionJobStatus, MockKnowledgeBaseManager};
    use crate::domain::DomainError;
    use std::time::Duration;

    fn kb_id() -> KnowledgeBaseId {
        KnowledgeBaseId::new("KB12345678").unwrap()
    }

    fn instant_policy() -> PollPolicy {
        PollPolicy::new(Duration::ZERO, Duration::ZERO, 2, 5)
    }

    #[tokio::test]
    async fn test_ingest_all_data_sources() {
        let manager = Arc::new(
            MockKnowledgeBaseManager::new(kb_id())
                .with_data_source("DS00000001", "one")
                .with_data_source("DS00000002", "two"),
        );
        let mut output = OutputWriter::new(Vec::new(), true);

        execute(
            IngestArgs {
                kb_id: kb_id(),
                data_source_id: None,
                no_wait: false,
            },
            manager.clone(),
            instant_policy(),
            &mut output,
        )
        .await
        .unwrap();

        assert_eq!(manager.started_jobs().len(), 2);

        let jobs: serde_json::Value =
            serde_json::from_slice(&output.into_inner()).unwrap();
        assert_eq!(jobs.as_array().map(|a| a.len()), Some(2));
    }

    #[tokio::test]
    async fn test_ingest_single_data_source() {
        let manager = Arc::new(MockKnowledgeBaseManager::new(kb_id()));
        let mut output = OutputWriter::new(Vec::new(), false);

        execute(
            IngestArgs {
                kb_id: kb_id(),
                data_source_id: Some(DataSourceId::new("DS00000009").unwrap()),
                no_wait: true,
            },
            manager.clone(),
            instant_policy(),
            &mut output,
        )
        .await
        .unwrap();

        assert_eq!(
            manager.started_jobs(),
            vec![DataSourceId::new("DS00000009").unwrap()]
        );
        assert_eq!(manager.job_polls(), 0);
    }

    #[tokio::test]
    async fn test_ingest_stopped_job_is_an_error() {
        let manager = Arc::new(
            MockKnowledgeBaseManager::new(kb_id())
                .with_data_source("DS00000001", "one")
                .with_job_statuses(vec![IngestionJobStatus::Stopped]),
        );
        let mut output = OutputWriter::new(Vec::new(), false);

        let result = execute(
            IngestArgs {
                kb_id: kb_id(),
                data_source_id: None,
                no_wait: false,
            },
            manager,
            instant_policy(),
            &mut output,
        )
        .await;

        let error = result.unwrap_err();
        assert!(matches!(
            error.downcast_ref::<DomainError>(),
            Some(DomainError::Ingestion { .. })
        ));
    }
}
