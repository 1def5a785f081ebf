use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use claimcheck::config::Models;
use claimcheck::server::{run_server, Engine};
use claimcheck::types::VerifyRequest;

#[derive(Parser)]
#[command(name = "claimcheck", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
    /// Model registry (JSON)
    #[arg(long, default_value = "./models.json")]
    models: String,
    /// Max concurrent transport calls on the classifier path
    #[arg(long, default_value_t = 8)]
    concurrency: usize,
}

#[derive(Subcommand)]
enum Cmd {
    /// Serve POST /verify
    Serve {
        #[arg(long, default_value = "0.0.0.0:8080")]
        addr: String,
    },
    /// Verify one response against one context and print the result as JSON
    Verify {
        #[arg(long)]
        context_file: String,
        #[arg(long)]
        response_file: String,
        #[arg(long)]
        model: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let models = Models::load(&cli.models)?;
    let engine = Engine::from_models(models, cli.concurrency);

    match cli.cmd {
        Cmd::Serve { addr } => run_server(engine, &addr).await?,
        Cmd::Verify { context_file, response_file, model } => {
            let context = std::fs::read_to_string(&context_file)?;
            let response = std::fs::read_to_string(&response_file)?;
            let req = VerifyRequest { input: response, context, model };
            let out = engine.verify(&req).await?;
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
    }
    Ok(())
}
