//! Gateway binary

use clap::{Parser, Subcommand};
use warmgate::{Gateway, GatewayConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "warmgate-gateway")]
#[command(about = "warmgate edge cache gateway with background revalidation")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway server
    Serve {
        /// Bind address for HTTP
        #[arg(long)]
        bind: Option<std::net::SocketAddr>,

        /// Default origin URL for unconfigured domains
        #[arg(long)]
        origin: Option<String>,

        /// Default cache-key prefix
        #[arg(long)]
        prefix: Option<String>,

        /// Default project id
        #[arg(long)]
        project: Option<String>,

        /// Paths warmed concurrently per batch
        #[arg(long)]
        batch_size: Option<usize>,

        /// Lease after which a revalidation lock is reclaimed (e.g. "15m")
        #[arg(long)]
        lock_lease: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            bind,
            origin,
            prefix,
            project,
            batch_size,
            lock_lease,
        } => {
            // Load config from file/env, then override with CLI arguments
            let mut config = GatewayConfig::load();
            if let Some(bind) = bind {
                config.bind_addr = bind;
            }
            if let Some(origin) = origin {
                config.origin_url = origin;
            }
            if let Some(prefix) = prefix {
                config.cache_prefix = prefix;
            }
            if let Some(project) = project {
                config.project_id = project;
            }
            if let Some(batch_size) = batch_size {
                config.warm_batch_size = batch_size;
            }
            if let Some(lock_lease) = lock_lease {
                config.lock_lease = lock_lease;
            }

            Gateway::new(config).serve().await?;
        }
    }

    Ok(())
}
