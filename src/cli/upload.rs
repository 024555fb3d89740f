//! Upload command - stages a local directory into a bucket

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;

use super::output::OutputWriter;
use crate::config::AppConfig;
use crate::domain::knowledge_base::validate_bucket_name;
use crate::domain::storage::ObjectStore;
use crate::infrastructure::aws::load_sdk_config;
use crate::infrastructure::services::DirectoryUploader;
use crate::infrastructure::storage::S3ObjectStore;

/// Arguments for the upload command
#[derive(Args, Debug, Clone)]
pub struct UploadArgs {
    /// Local directory to upload (walked recursively)
    #[arg(long, value_name = "DIR")]
    pub path: PathBuf,

    /// Target bucket
    #[arg(long)]
    pub bucket: String,

    /// Create the bucket when it does not exist
    #[arg(long)]
    pub create_bucket: bool,
}

/// Run the upload command against S3
pub async fn run(args: UploadArgs, config: &AppConfig, json: bool) -> anyhow::Result<()> {
    validate_bucket_name(&args.bucket)?;

    let sdk_config = load_sdk_config(&config.aws).await;
    let store: Arc<dyn ObjectStore> = Arc::new(S3ObjectStore::new(&sdk_config));

    execute(args, store, &mut OutputWriter::stdout(json)).await
}

pub async fn execute<W: Write>(
    args: UploadArgs,
    store: Arc<dyn ObjectStore>,
    output: &mut OutputWriter<W>,
) -> anyhow::Result<()> {
    let uploader = DirectoryUploader::new(store);

    if args.create_bucket {
        uploader.ensure_bucket(&args.bucket).await?;
    }

    let report = uploader.upload_directory(&args.path, &args.bucket).await?;
    output.upload_report(&report)
}
