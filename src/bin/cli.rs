//! CLI for gateway operations

use clap::{Parser, Subcommand};
use serde_json::json;

#[derive(Parser)]
#[command(name = "warmgate")]
#[command(about = "warmgate edge cache gateway CLI")]
#[command(version)]
struct Cli {
    /// Gateway URL
    #[arg(long, default_value = "http://localhost:8080")]
    gateway: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Queue a cache warming run
    Prewarm {
        /// Paths to warm (the origin sitemap is used when omitted)
        paths: Vec<String>,

        /// Domain the deployment serves
        #[arg(long)]
        domain: String,

        /// Deployment id to warm
        #[arg(long)]
        deployment: String,

        /// Origin URL
        #[arg(long)]
        origin: String,

        /// Cache-key prefix
        #[arg(long, default_value = "docs")]
        prefix: String,

        /// Project id
        #[arg(long, default_value = "default_project")]
        project: String,
    },

    /// Announce a new deployment (sets the expected version)
    Deploy {
        /// Project id
        #[arg(long)]
        project: String,

        /// New deployment id
        #[arg(long)]
        deployment: String,
    },

    /// Gateway health
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Prewarm {
            paths,
            domain,
            deployment,
            origin,
            prefix,
            project,
        } => {
            let body = json!({
                "paths": paths,
                "cachePrefix": prefix,
                "deploymentId": deployment,
                "originUrl": origin,
                "projectId": project,
                "domain": domain,
            });
            let response = client
                .post(format!("{}/prewarm", cli.gateway))
                .json(&body)
                .send()
                .await?;
            println!("{} {}", response.status(), response.text().await?);
        }

        Commands::Deploy {
            project,
            deployment,
        } => {
            let body = json!({
                "projectId": project,
                "deploymentId": deployment,
            });
            let response = client
                .post(format!("{}/webhook/deployment", cli.gateway))
                .json(&body)
                .send()
                .await?;
            println!("{} {}", response.status(), response.text().await?);
        }

        Commands::Status => {
            let response = client
                .get(format!("{}/health", cli.gateway))
                .send()
                .await?;
            println!("{}", response.text().await?);
        }
    }

    Ok(())
}
