mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use umi_ocr::{Config, UmiClient};

use crate::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "umi_ocr=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = Config::from_env();
    if let Some(base_url) = args.base_url {
        config.client.base_url = base_url;
    }

    tracing::debug!(
        "Connecting to {} (timeout: {:?})",
        config.client.base_url,
        config.client.timeout_secs
    );
    let client = UmiClient::new(&config.client)?;

    cli::run(args.command, &client, &config.polling).await
}
