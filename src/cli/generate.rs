//! Generate command - retrieval-augmented answer from a knowledge base

use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Args;
use tracing::error;

use super::output::OutputWriter;
use super::parse_id;
use super::query::{connect_runtime, QueryArgs, RuntimeConnection};
use crate::config::AppConfig;
use crate::domain::knowledge_base::{
    GenerateRequest, KnowledgeBaseId, PromptTemplate, MAX_NUMBER_OF_RESULTS,
};
use crate::domain::DomainError;
use crate::infrastructure::services::QueryService;

/// Arguments for the generate command
#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Knowledge base ID
    #[arg(long = "kb-id", alias = "kb_id", value_parser = parse_id::<KnowledgeBaseId>)]
    pub kb_id: KnowledgeBaseId,

    #[command(flatten)]
    pub query: QueryArgs,

    /// Number of chunks retrieved for the answer (defaults to generation.max_results)
    #[arg(
        long,
        alias = "max_results",
        value_parser = clap::value_parser!(u32).range(1..=MAX_NUMBER_OF_RESULTS as i64)
    )]
    pub max_results: Option<u32>,

    /// Generation model ARN (defaults to the configured foundation model)
    #[arg(long)]
    pub model_arn: Option<String>,

    /// Use the built-in question-answering prompt template
    #[arg(long)]
    pub custom_prompt: bool,

    /// Read the prompt template from a file
    #[arg(long, value_name = "PATH", conflicts_with = "custom_prompt")]
    pub prompt_template_file: Option<PathBuf>,

    /// Print only the answer, without the retrieved context
    #[arg(long)]
    pub no_context: bool,
}

/// Run the generate command against Bedrock
pub async fn run(args: GenerateArgs, config: &AppConfig, json: bool) -> anyhow::Result<()> {
    execute(
        args,
        config,
        || connect_runtime(config),
        &mut OutputWriter::stdout(json),
    )
    .await
}

fn read_template(path: &Path) -> Result<PromptTemplate, DomainError> {
    std::fs::read_to_string(path).map(PromptTemplate::new).map_err(|e| {
        error!(path = %path.display(), error = %e, "Failed to read prompt template");
        DomainError::validation(format!(
            "failed to read prompt template '{}': {}",
            path.display(),
            e
        ))
    })
}

/// Resolve local inputs, then connect and generate
pub async fn execute<W, F, Fut>(
    args: GenerateArgs,
    config: &AppConfig,
    connect: F,
    output: &mut OutputWriter<W>,
) -> anyhow::Result<()>
where
    W: Write,
    F: FnOnce() -> Fut,
    Fut: Future<Output = RuntimeConnection>,
{
    let query = args.query.resolve()?;

    let template = match (&args.prompt_template_file, args.custom_prompt) {
        (Some(path), _) => Some(read_template(path)?),
        (None, true) => Some(PromptTemplate::question_answering()),
        (None, false) => None,
    };

    let number_of_results = args.max_results.unwrap_or(config.generation.max_results);

    let connection = connect().await;
    let model_arn = match args.model_arn {
        Some(arn) => arn,
        None => config.generation.resolve_model_arn(
            connection
                .region
                .as_deref()
                .or(config.aws.region.as_deref()),
        )?,
    };

    let mut request = GenerateRequest::new(args.kb_id, query, model_arn)
        .with_number_of_results(number_of_results);
    if let Some(template) = template {
        request = request.with_prompt_template(template);
    }

    let result = QueryService::new(connection.runtime)
        .generate(request)
        .await?;

    output.generation(&result, !args.no_context)
}
