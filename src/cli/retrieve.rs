//! Retrieve command - similarity search against a knowledge base

use std::future::Future;
use std::io::Write;

use clap::Args;

use super::output::OutputWriter;
use super::parse_id;
use super::query::{connect_runtime, QueryArgs, RuntimeConnection};
use crate::config::AppConfig;
use crate::domain::knowledge_base::{KnowledgeBaseId, RetrieveRequest, MAX_NUMBER_OF_RESULTS};
use crate::infrastructure::services::QueryService;

/// Arguments for the retrieve command
#[derive(Args, Debug, Clone)]
pub struct RetrieveArgs {
    /// Knowledge base ID
    #[arg(long = "kb-id", alias = "kb_id", value_parser = parse_id::<KnowledgeBaseId>)]
    pub kb_id: KnowledgeBaseId,

    #[command(flatten)]
    pub query: QueryArgs,

    /// Number of chunks to retrieve (defaults to retrieval.number_of_results)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=MAX_NUMBER_OF_RESULTS as i64))]
    pub chunks: Option<u32>,

    /// Pagination token from a previous retrieve
    #[arg(long)]
    pub next_token: Option<String>,

    /// Follow pagination tokens up to retrieval.max_pages pages
    #[arg(long, conflicts_with = "next_token")]
    pub all_pages: bool,
}

/// Run the retrieve command against Bedrock
pub async fn run(args: RetrieveArgs, config: &AppConfig, json: bool) -> anyhow::Result<()> {
    execute(
        args,
        config,
        || connect_runtime(config),
        &mut OutputWriter::stdout(json),
    )
    .await
}

/// Resolve the query, then connect and retrieve; nothing is sent when the query cannot be read
pub async fn execute<W, F, Fut>(
    args: RetrieveArgs,
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

    let mut request = RetrieveRequest::new(args.kb_id, query).with_number_of_results(
        args.chunks.unwrap_or(config.retrieval.number_of_results),
    );
    if let Some(token) = args.next_token {
        request = request.with_next_token(token);
    }
    request.validate()?;

    let service = QueryService::new(connect().await.runtime);

    let page = if args.all_pages {
        service
            .retrieve_all_pages(request, config.retrieval.max_pages)
            .await?
    } else {
        service.retrieve(request).await?
    };

    output.chunks(&page)
}
