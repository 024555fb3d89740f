//! Query text input shared by the query commands

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use tracing::error;

use crate::config::AppConfig;
use crate::domain::knowledge_base::KnowledgeBaseRuntime;
use crate::domain::DomainError;
use crate::infrastructure::aws::load_sdk_config;
use crate::infrastructure::knowledge_base::BedrockKnowledgeBaseRuntime;

/// Query text, given inline or read from a file (exactly one is required)
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct QueryArgs {
    /// Query text
    #[arg(long)]
    pub query: Option<String>,

    /// Read the query text from a UTF-8 file
    #[arg(long, value_name = "PATH")]
    pub query_file: Option<PathBuf>,
}

impl QueryArgs {
    /// Resolve the query text, reading the file when one was given
    pub fn resolve(&self) -> Result<String, DomainError> {
        if let Some(query) = &self.query {
            return Ok(query.clone());
        }

        let Some(path) = &self.query_file else {
            return Err(DomainError::validation(
                "either --query or --query-file is required",
            ));
        };

        std::fs::read_to_string(path).map_err(|e| {
            error!(path = %path.display(), error = %e, "Failed to read query file");
            DomainError::validation(format!(
                "failed to read query file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}

/// A runtime client and the region it talks to
pub struct RuntimeConnection {
    pub runtime: Arc<dyn KnowledgeBaseRuntime>,
    pub region: Option<String>,
}

impl RuntimeConnection {
    pub fn new(runtime: Arc<dyn KnowledgeBaseRuntime>, region: Option<&str>) -> Self {
        Self {
            runtime,
            region: region.map(str::to_string),
        }
    }
}

/// Connect to the Bedrock Agent Runtime configured for this process
pub async fn connect_runtime(config: &AppConfig) -> RuntimeConnection {
    let sdk_config = load_sdk_config(&config.aws).await;
    let region = sdk_config.region().map(|r| r.as_ref().to_string());

    RuntimeConnection {
        runtime: Arc::new(BedrockKnowledgeBaseRuntime::new(&sdk_config)),
        region,
    }
}
