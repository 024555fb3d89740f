use clap::Parser;
use bedrock_kb::cli::{self, Cli};
use bedrock_kb::config::AppConfig;
use bedrock_kb::infrastructure::logging::init_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = AppConfig::load().unwrap_or_default();
    cli.apply_overrides(&mut config);
    init_logging(&config.logging);

    cli::run(cli, &config).await
}
