use anyhow::Result;
use clap::{Parser, Subcommand};
use ct_server::commands::{
    canon::{cmd_canon, CanonArgs},
    keygen::{cmd_keygen, KeygenArgs},
    verify::{cmd_verify, VerifyArgs},
};
use ct_server::config::{ServeArgs, DEFAULT_LOG_FILTER};
use ct_server::state::AppState;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Content-trust signing service and offline tools.
#[derive(Parser, Debug)]
#[command(name = "ct", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP signing and verification service
    Serve(ServeArgs),
    /// Print the canonical form and digest of a JSON file
    Canon(CanonArgs),
    /// Verify a signed JSON document
    Verify(VerifyArgs),
    /// Generate a signing key and its trust anchor
    Keygen(KeygenArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve(args) => serve(args).await,
        Commands::Canon(args) => cmd_canon(args),
        Commands::Verify(args) => cmd_verify(args),
        Commands::Keygen(args) => cmd_keygen(args),
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    let state = AppState::from_args(&args)?;
    let app = ct_server::build_router(state);

    let listener = tokio::net::TcpListener::bind(args.listen).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
