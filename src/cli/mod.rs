//! CLI module for bedrock-kb
//!
//! Provides subcommands covering the knowledge base lifecycle:
//! - `upload`: stage a local directory into a bucket
//! - `create`: provision a knowledge base with S3 data sources and ingest them
//! - `ingest` / `ingestion-status`: run and inspect ingestion jobs
//! - `retrieve`, `generate`, `test`: query a knowledge base

pub mod create;
pub mod generate;
pub mod ingest;
pub mod ingestion_status;
pub mod output;
pub mod query;
pub mod retrieve;
pub mod test_kb;
pub mod upload;

use clap::{Parser, Subcommand};

use crate::config::{AppConfig, LogFormat};
use crate::domain::knowledge_base::KnowledgeBaseValidationError;

/// bedrock-kb - stage documents, build and query Amazon Bedrock knowledge bases
#[derive(Parser, Debug)]
#[command(name = "bedrock-kb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log level or filter directive (overrides config)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log output format (overrides config)
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Upload every file under a directory to a bucket
    Upload(upload::UploadArgs),

    /// Create a knowledge base with S3 data sources and run ingestion
    Create(create::CreateArgs),

    /// Start ingestion jobs and wait for them to finish
    Ingest(ingest::IngestArgs),

    /// Show the status of one ingestion job
    IngestionStatus(ingestion_status::IngestionStatusArgs),

    /// Retrieve relevant chunks for a query
    Retrieve(retrieve::RetrieveArgs),

    /// Retrieve and generate an answer for a query
    Generate(generate::GenerateArgs),

    /// Generate an answer, then list the retrieved chunks
    Test(test_kb::TestArgs),
}

impl Cli {
    /// Apply command-line logging overrides to the loaded configuration
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }

        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
    }
}

/// Run the parsed command
pub async fn run(cli: Cli, config: &AppConfig) -> anyhow::Result<()> {
    let json = cli.json;

    match cli.command {
        Command::Upload(args) => upload::run(args, config, json).await,
        Command::Create(args) => create::run(args, config, json).await,
        Command::Ingest(args) => ingest::run(args, config, json).await,
        Command::IngestionStatus(args) => ingestion_status::run(args, config, json).await,
        Command::Retrieve(args) => retrieve::run(args, config, json).await,
        Command::Generate(args) => generate::run(args, config, json).await,
        Command::Test(args) => test_kb::run(args, config, json).await,
    }
}

/// Parse a service identifier, checking its format locally
pub(crate) fn parse_id<T>(value: &str) -> Result<T, KnowledgeBaseValidationError>
where
    T: TryFrom<String, Error = KnowledgeBaseValidationError>,
{
    T::try_from(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_query_and_query_file_are_mutually_exclusive() {
        let result = Cli::try_parse_from([
            "bedrock-kb",
            "retrieve",
            "--kb-id",
            "KB12345678",
            "--query",
            "hello",
            "--query-file",
            "query.txt",
        ]);

        assert!(result.is_err());
    }

    #[test]
    fn test_query_is_required() {
        let result = Cli::try_parse_from(["bedrock-kb", "generate", "--kb-id", "KB12345678"]);

        assert!(result.is_err());
    }

    #[test]
    fn test_kb_id_underscore_alias() {
        let cli = Cli::try_parse_from([
            "bedrock-kb",
            "test",
            "--kb_id",
            "KB12345678",
            "--query",
            "hello",
        ])
        .unwrap();

        match cli.command {
            Command::Test(args) => {
                assert_eq!(args.kb_id.as_str(), "KB12345678");
                assert_eq!(args.chunks, 5);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_kb_id_rejected_at_parse_time() {
        let result = Cli::try_parse_from([
            "bedrock-kb",
            "retrieve",
            "--kb-id",
            "not-an-id",
            "--query",
            "hello",
        ]);

        assert!(result.is_err());
    }

    #[test]
    fn test_chunks_out_of_range_rejected() {
        let result = Cli::try_parse_from([
            "bedrock-kb",
            "retrieve",
            "--kb-id",
            "KB12345678",
            "--query",
            "hello",
            "--chunks",
            "101",
        ]);

        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "bedrock-kb",
            "retrieve",
            "--kb-id",
            "KB12345678",
            "--query",
            "hello",
            "--json",
            "--log-level",
            "debug",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert!(cli.json);

        let mut config = AppConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }
}
