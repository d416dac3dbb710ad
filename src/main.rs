use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tributary::app::AppContext;
use tributary::cli::{commands, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so `posts --json` output stays parseable
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tributary=info")),
        )
        .init();

    let cli = Cli::parse();
    let ctx = AppContext::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Posts {
            source,
            limit,
            json,
        } => {
            commands::list_posts(&ctx, source.as_deref(), limit, json).await?;
        }
        Commands::Sources => {
            commands::list_sources(&ctx).await?;
        }
        Commands::Serve { addr } => {
            commands::serve(&ctx, addr.as_deref()).await?;
        }
    }

    Ok(())
}
