use clap::Parser;
use greenscreen_compositor::cli::{Cli, Command};
use greenscreen_compositor::{commands, config, server};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Command::Serve(args) => {
            let config = config::Config::from(args);

            tracing::info!(
                "Starting greenscreen-compositor v{}",
                env!("CARGO_PKG_VERSION")
            );
            tracing::info!("Binding to {}:{}", config.host, config.port);

            server::run(config).await
        }
        Command::Detect(args) => {
            let output = tokio::task::spawn_blocking(move || commands::run_detect(args)).await??;
            println!("{}", serde_json::to_string(&output)?);
            Ok(())
        }
        Command::Composite(args) => {
            let written =
                tokio::task::spawn_blocking(move || commands::run_composite(args)).await??;
            tracing::info!("Wrote {} composite(s)", written.len());
            Ok(())
        }
    }
}
