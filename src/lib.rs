//! bedrock-kb
//!
//! A thin client over Amazon Bedrock knowledge bases:
//! - Stage local documents into S3
//! - Provision knowledge bases with S3 data sources and run ingestion jobs
//! - Retrieve chunks and generate answers with citations

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
