//! Test command - smoke test of a knowledge base: generate, then list retrieved chunks

use std::future::Future;
use std::io::Write;

use clap::Args;

use super::output::OutputWriter;
use super::parse_id;
use super::query::{connect_runtime, QueryArgs, RuntimeConnection};
use crate::config::AppConfig;
use crate::domain::knowledge_base::{
    GenerateRequest, KnowledgeBaseId, RetrieveRequest, DEFAULT_NUMBER_OF_RESULTS,
    MAX_NUMBER_OF_RESULTS,
};
use crate::infrastructure::services::QueryService;

/// Arguments for the test command
#[derive(Args, Debug, Clone)]
pub struct TestArgs {
    /// Knowledge base ID
    #[arg(long = "kb-id", alias = "kb_id", value_parser = parse_id::<KnowledgeBaseId>)]
    pub kb_id: KnowledgeBaseId,

    #[command(flatten)]
    pub query: QueryArgs,

    /// Number of chunks to retrieve
    #[arg(
        long,
        default_value_t = DEFAULT_NUMBER_OF_RESULTS,
        value_parser = clap::value_parser!(u32).range(1..=MAX_NUMBER_OF_RESULTS as i64)
    )]
    pub chunks: u32,
}

/// Run the test command against Bedrock
pub async fn run(args: TestArgs, config: &AppConfig, json: bool) -> anyhow::Result<()> {
    execute(
        args,
        config,
        || connect_runtime(config),
        &mut OutputWriter::stdout(json),
    )
    .await
}

/// Generate with the service's default prompt, then retrieve `chunks` chunks
pub async fn execute<W, F, Fut>(
    args: TestArgs,
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

    let retrieve_request = RetrieveRequest::new(args.kb_id.clone(), query.clone())
        .with_number_of_results(args.chunks);
    retrieve_request.validate()?;

    let connection = connect().await;
    let model_arn = config.generation.resolve_model_arn(
        connection
            .region
            .as_deref()
            .or(config.aws.region.as_deref()),
    )?;

    let service = QueryService::new(connection.runtime);

    let generate_request = GenerateRequest::new(args.kb_id, query, model_arn)
        .with_number_of_results(config.generation.max_results);
    let result = service.generate(generate_request).await?;
    let page = service.retrieve(retrieve_request).await?;

    output.answer_with_chunks(&result, &page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::knowledge_base::{
        GenerationResult, KnowledgeBaseRuntime, MockKnowledgeBaseRuntime, RetrievalPage,
        RetrievedChunk,
    };
    use std::sync::Arc;

    #[tokio::test]
    async fn test_generates_then_retrieves() {
        let runtime = Arc::new(
            MockKnowledgeBaseRuntime::new()
                .with_generation(GenerationResult::new("A managed RAG service."))
                .with_page(RetrievalPage::new(vec![
                    RetrievedChunk::new("chunk one").with_score(0.7),
                    RetrievedChunk::new("chunk two").with_score(0.6),
                    RetrievedChunk::new("chunk three").with_score(0.5),
                ])),
        );
        let mut output = OutputWriter::new(Vec::new(), false);

        let handle = runtime.clone();
        execute(
            TestArgs {
                kb_id: KnowledgeBaseId::new("KB12345678").unwrap(),
                query: QueryArgs {
                    query: Some("What is Bedrock?".to_string()),
                    query_file: None,
                },
                chunks: 2,
            },
            &AppConfig::default(),
            || async move {
                RuntimeConnection::new(handle as Arc<dyn KnowledgeBaseRuntime>, Some("us-east-1"))
            },
            &mut output,
        )
        .await
        .unwrap();

        let generate = runtime.generate_requests();
        assert_eq!(generate.len(), 1);
        assert!(generate[0].prompt_template.is_none());
        assert_eq!(runtime.retrieve_requests()[0].number_of_results, 2);

        let text = String::from_utf8(output.into_inner()).unwrap();
        assert!(text.contains("A managed RAG service."));
        assert!(text.contains("chunk two"));
        assert!(!text.contains("chunk three"));
    }

    #[tokio::test]
    async fn test_missing_query_file_fails_before_connecting() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = Arc::new(MockKnowledgeBaseRuntime::new());
        let mut output = OutputWriter::new(Vec::new(), false);

        let handle = runtime.clone();
        let result = execute(
            TestArgs {
                kb_id: KnowledgeBaseId::new("KB12345678").unwrap(),
                query: QueryArgs {
                    query: None,
                    query_file: Some(dir.path().join("query.txt")),
                },
                chunks: 5,
            },
            &AppConfig::default(),
            || async move { RuntimeConnection::new(handle as Arc<dyn KnowledgeBaseRuntime>, None) },
            &mut output,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(runtime.call_count(), 0);
    }
}
