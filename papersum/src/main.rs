use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use papersum::api::{create_router, AppState};
use papersum::config::Config;
use papersum::db::{Database, DatabaseBackend, LibSqlBackend};
use papersum::llm::LlmBackend;
use papersum::processing::AnalysisPipeline;
use papersum::services::{validate_source_url, JobProcessor};

#[derive(Parser)]
#[command(name = "papersum")]
#[command(about = "Plain-language summaries of research papers and articles")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// Also drain the job queue in this process
        #[arg(long)]
        with_worker: bool,
    },
    /// Drain the job queue without serving HTTP
    Worker,
    /// Summarize one URL and print the result as JSON
    Analyze { url: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env();

    match cli.command {
        Command::Serve { with_worker } => serve(config, with_worker).await,
        Command::Worker => worker(config).await,
        Command::Analyze { url } => analyze(config, &url).await,
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "papersum=info,tower_http=debug".into());
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    // stderr keeps stdout clean for `papersum analyze`.
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn open_database(config: &Config) -> anyhow::Result<Arc<dyn DatabaseBackend>> {
    tracing::info!("Initializing database...");
    let raw_db = Database::new(&config.database)
        .await
        .context("failed to open job database")?;
    Ok(Arc::new(LibSqlBackend::new(raw_db)))
}

fn build_pipeline(config: &Config) -> anyhow::Result<AnalysisPipeline> {
    if let Some(llm_config) = &config.llm {
        tracing::info!("Initializing LLM provider: {}...", llm_config.model);
    }
    let pipeline = AnalysisPipeline::from_config(config)?;
    if let LlmBackend::Unavailable { reason } = pipeline.llm().backend() {
        tracing::warn!(%reason, "LLM unavailable; every analysis will fail");
    }
    Ok(pipeline)
}

async fn serve(config: Config, with_worker: bool) -> anyhow::Result<()> {
    let db = open_database(&config).await?;
    let pipeline = build_pipeline(&config)?;
    let cancel_token = CancellationToken::new();

    let worker = if with_worker {
        tracing::info!(
            "Starting job processor... (interval={}s)",
            config.worker.poll_interval_secs
        );
        let processor = JobProcessor::new(
            db.clone(),
            pipeline.clone(),
            config.worker.poll_interval_secs,
        );
        let token = cancel_token.child_token();
        Some(tokio::spawn(async move { processor.run(token).await }))
    } else {
        None
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = create_router(AppState::new(config, db, pipeline));

    tracing::info!("Papersum starting on http://{}", addr);
    tracing::info!("  Health check: http://{}/api/v1/health", addr);
    tracing::info!("  API docs:     http://{}/api/v1/docs", addr);
    tracing::info!("  OpenAPI spec: http://{}/api/v1/openapi.json", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel_token.clone()))
        .await?;

    cancel_token.cancel();
    if let Some(handle) = worker {
        handle.await.context("job processor task failed")?;
    }

    Ok(())
}

async fn worker(config: Config) -> anyhow::Result<()> {
    let db = open_database(&config).await?;
    let pipeline = build_pipeline(&config)?;
    let processor = JobProcessor::new(db, pipeline, config.worker.poll_interval_secs);

    let cancel_token = CancellationToken::new();
    tokio::spawn(shutdown_signal(cancel_token.clone()));

    tracing::info!(
        "Job processor running (interval={}s)",
        processor.interval_secs()
    );
    processor.run(cancel_token).await;

    Ok(())
}

async fn analyze(config: Config, url: &str) -> anyhow::Result<()> {
    let url = validate_source_url(url)?;
    let pipeline = build_pipeline(&config)?;

    let result = pipeline.analyze(url.as_str()).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}

async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, cancelling background tasks...");
    cancel_token.cancel();
}
