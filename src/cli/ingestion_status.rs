//! Ingestion status command - prints one ingestion job

use std::io::Write;
use std::sync::Arc;

use clap::Args;

use super::output::OutputWriter;
use super::parse_id;
use crate::config::AppConfig;
use crate::domain::knowledge_base::{
    DataSourceId, IngestionJobId, KnowledgeBaseId, KnowledgeBaseManager,
};
use crate::infrastructure::aws::load_sdk_config;
use crate::infrastructure::knowledge_base::BedrockKnowledgeBaseManager;

/// Arguments for the ingestion-status command
#[derive(Args, Debug, Clone)]
pub struct IngestionStatusArgs {
    /// Knowledge base ID
    #[arg(long = "kb-id", alias = "kb_id", value_parser = parse_id::<KnowledgeBaseId>)]
    pub kb_id: KnowledgeBaseId,

    /// Data source ID
    #[arg(long, value_parser = parse_id::<DataSourceId>)]
    pub data_source_id: DataSourceId,

    /// Ingestion job ID
    #[arg(long, value_parser = parse_id::<IngestionJobId>)]
    pub job_id: IngestionJobId,
}

/// Run the ingestion-status command against Bedrock
pub async fn run(args: IngestionStatusArgs, config: &AppConfig, json: bool) -> anyhow::Result<()> {
    let sdk_config = load_sdk_config(&config.aws).await;
    let manager: Arc<dyn KnowledgeBaseManager> =
        Arc::new(BedrockKnowledgeBaseManager::new(&sdk_config));

    execute(args, manager, &mut OutputWriter::stdout(json)).await
}

pub async fn execute<W: Write>(
    args: IngestionStatusArgs,
    manager: Arc<dyn KnowledgeBaseManager>,
    output: &mut OutputWriter<W>,
) -> anyhow::Result<()> {
    let job = manager
        .get_ingestion_job(&args.kb_id, &args.data_source_id, &args.job_id)
        .await?;

    output.ingestion_jobs(std::slice::from_ref(&job))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::knowledge_base::{IngestionJobStatus, MockKnowledgeBaseManager};

    #[tokio::test]
    async fn test_prints_job_status() {
        let kb_id = KnowledgeBaseId::new("KB12345678").unwrap();
        let manager = Arc::new(
            MockKnowledgeBaseManager::new(kb_id.clone())
                .with_job_statuses(vec![IngestionJobStatus::InProgress]),
        );
        let mut output = OutputWriter::new(Vec::new(), false);

        execute(
            IngestionStatusArgs {
                kb_id,
                data_source_id: DataSourceId::new("DS00000001").unwrap(),
                job_id: IngestionJobId::new("JOB0000001").unwrap(),
            },
            manager.clone(),
            &mut output,
        )
        .await
        .unwrap();

        let text = String::from_utf8(output.into_inner()).unwrap();
        assert!(text.contains("Ingestion job JOB0000001 (data source DS00000001): IN_PROGRESS"));
        assert_eq!(manager.job_polls(), 1);
    }
}
