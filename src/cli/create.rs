//! Create command - provisions a knowledge base, stages documents and runs ingestion

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, ValueEnum};
use tracing::{error, info};

use super::output::OutputWriter;
use crate::config::AppConfig;
use crate::domain::knowledge_base::{
    ChunkingStrategy, CreateKnowledgeBaseRequest, DataSourceSpec, KnowledgeBaseManager,
    PollPolicy,
};
use crate::domain::storage::ObjectStore;
use crate::domain::DomainError;
use crate::infrastructure::aws::load_sdk_config;
use crate::infrastructure::knowledge_base::BedrockKnowledgeBaseManager;
use crate::infrastructure::services::{
    DirectoryUploader, KnowledgeBaseProvisioner, ProvisionRequest,
};
use crate::infrastructure::storage::S3ObjectStore;

/// Length of the timestamp suffix used in generated names
const SUFFIX_LENGTH: usize = 7;

/// Chunking applied to every data source
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChunkingKind {
    /// Let the service decide
    Default,
    /// One chunk per document
    None,
    FixedSize,
    Hierarchical,
    Semantic,
}

impl From<ChunkingKind> for ChunkingStrategy {
    fn from(kind: ChunkingKind) -> Self {
        match kind {
            ChunkingKind::Default => ChunkingStrategy::ServiceDefault,
            ChunkingKind::None => ChunkingStrategy::None,
            ChunkingKind::FixedSize => ChunkingStrategy::fixed_size(),
            ChunkingKind::Hierarchical => ChunkingStrategy::hierarchical(),
            ChunkingKind::Semantic => ChunkingStrategy::semantic(),
        }
    }
}

/// Arguments for the create command
#[derive(Args, Debug, Clone)]
pub struct CreateArgs {
    /// Knowledge base name (generated from a timestamp when omitted)
    #[arg(long)]
    pub name: Option<String>,

    /// Knowledge base description (overrides config)
    #[arg(long)]
    pub description: Option<String>,

    /// S3 bucket backing a data source; repeat for several data sources
    #[arg(long = "bucket", value_name = "NAME")]
    pub buckets: Vec<String>,

    /// Local directory uploaded into the first bucket before ingestion
    #[arg(long, value_name = "DIR")]
    pub dataset_dir: Option<PathBuf>,

    /// Create missing buckets
    #[arg(long)]
    pub create_bucket: bool,

    /// Chunking strategy for the data sources
    #[arg(long, value_enum, default_value_t = ChunkingKind::FixedSize)]
    pub chunking: ChunkingKind,

    /// Start ingestion without waiting for it to finish
    #[arg(long)]
    pub no_wait: bool,
}

/// Everything the create workflow needs, resolved before any remote call
#[derive(Debug, Clone)]
pub struct CreatePlan {
    pub request: ProvisionRequest,
    pub buckets: Vec<String>,
    pub dataset_dir: Option<PathBuf>,
    pub create_bucket: bool,
    pub wait: bool,
}

/// Last characters of the current local timestamp, used to make names unique
pub fn timestamp_suffix() -> String {
    let timestamp = chrono::Local::now().format("%Y%m%d%H%M%S").to_string();
    timestamp[timestamp.len() - SUFFIX_LENGTH..].to_string()
}

/// Resolve names, buckets and provisioning settings
pub fn plan(args: CreateArgs, config: &AppConfig, suffix: &str) -> Result<CreatePlan, DomainError> {
    let provisioning = &config.provisioning;
    let prefix = &provisioning.name_prefix;

    let name = args
        .name
        .unwrap_or_else(|| format!("{}-knowledge-base-{}", prefix, suffix));

    let buckets = if args.buckets.is_empty() {
        vec![format!("{}-{}-1", prefix, suffix)]
    } else {
        args.buckets
    };

    let chunking = ChunkingStrategy::from(args.chunking);
    let data_sources: Vec<DataSourceSpec> = buckets
        .iter()
        .map(|bucket| DataSourceSpec::s3(bucket, chunking.clone()))
        .collect();

    for spec in &data_sources {
        spec.validate()?;
    }

    if let Some(dir) = &args.dataset_dir {
        if !dir.is_dir() {
            error!(path = %dir.display(), "Dataset directory not found");
            return Err(DomainError::validation(format!(
                "dataset directory '{}' not found",
                dir.display()
            )));
        }
    }

    let knowledge_base = CreateKnowledgeBaseRequest {
        name,
        description: Some(
            args.description
                .unwrap_or_else(|| provisioning.description.clone()),
        ),
        role_arn: provisioning.role_arn()?.to_string(),
        embedding_model_arn: provisioning.embedding_model_arn()?.to_string(),
        storage: provisioning.vector_storage()?,
    };
    knowledge_base.validate()?;

    Ok(CreatePlan {
        request: ProvisionRequest {
            knowledge_base,
            data_sources,
        },
        buckets,
        dataset_dir: args.dataset_dir,
        create_bucket: args.create_bucket,
        wait: !args.no_wait,
    })
}

/// Run the create command against AWS
pub async fn run(args: CreateArgs, config: &AppConfig, json: bool) -> anyhow::Result<()> {
    let plan = plan(args, config, &timestamp_suffix())?;

    let sdk_config = load_sdk_config(&config.aws).await;
    let store: Arc<dyn ObjectStore> = Arc::new(S3ObjectStore::new(&sdk_config));
    let manager: Arc<dyn KnowledgeBaseManager> =
        Arc::new(BedrockKnowledgeBaseManager::new(&sdk_config));

    execute(
        plan,
        store,
        manager,
        config.ingestion.poll_policy(),
        &mut OutputWriter::stdout(json),
    )
    .await
}

pub async fn execute<W: Write>(
    plan: CreatePlan,
    store: Arc<dyn ObjectStore>,
    manager: Arc<dyn KnowledgeBaseManager>,
    poll_policy: PollPolicy,
    output: &mut OutputWriter<W>,
) -> anyhow::Result<()> {
    let uploader = DirectoryUploader::new(store);
    let provisioner = KnowledgeBaseProvisioner::new(manager, poll_policy);

    if plan.create_bucket {
        for bucket in &plan.buckets {
            uploader.ensure_bucket(bucket).await?;
        }
    }

    let provisioned = provisioner.provision(plan.request).await?;
    let kb_id = provisioned.knowledge_base.id.clone();

    if let (Some(dir), Some(bucket)) = (&plan.dataset_dir, plan.buckets.first()) {
        uploader.upload_directory(dir, bucket).await?;
    }

    let mut jobs = Vec::with_capacity(provisioned.data_sources.len());
    for data_source in &provisioned.data_sources {
        jobs.push(provisioner.start_ingestion(&kb_id, &data_source.id).await?);
    }

    if plan.wait {
        jobs = provisioner.wait_for_all(&jobs).await?;
    }
    output.provisioned(&provisioned, &jobs)?;

    info!(kb_id = %kb_id, "Knowledge base ready; keep this kb_id for queries");

    KnowledgeBaseProvisioner::ensure_completed(&jobs)?;
    Ok(())
}
