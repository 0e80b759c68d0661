//! Video scoring command-line entry point.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vscore_genai::GeminiClient;
use vscore_intel::IntelClient;
use vscore_models::{AnalyzeRequest, ProgressKind, RunId};
use vscore_pipeline::composer::report_schema;
use vscore_pipeline::metrics::init_metrics;
use vscore_pipeline::{stage_upload, IndexRegistry, Pipeline, PipelineConfig};

#[derive(Parser, Debug)]
#[command(name = "vscore", version, about = "Score short-form videos")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze and score one video file
    Analyze {
        /// Video file to analyze (left in place; a staged copy is used)
        file: PathBuf,

        /// Content niche; detected automatically when omitted
        #[arg(long)]
        niche: Option<String>,

        /// Target platform, e.g. "TikTok"
        #[arg(long)]
        platform: Option<String>,

        /// Intended audience
        #[arg(long)]
        audience: Option<String>,

        /// Print progress events as JSON lines instead of only the report
        #[arg(long)]
        stream: bool,
    },
    /// Print the JSON schema of the score report
    Schema,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Install rustls crypto provider (required for TLS/HTTPS)
    let _ = rustls::crypto::ring::default_provider().install_default();

    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    // Colored output for dev, JSON for production. Logs go to stderr so
    // stdout carries only the report.
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("vscore=info,vscore_pipeline=info,vscore_intel=info,vscore_genai=info")
    });

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command {
        Command::Schema => {
            println!("{}", report_schema());
            Ok(ExitCode::SUCCESS)
        }
        Command::Analyze {
            file,
            niche,
            platform,
            audience,
            stream,
        } => {
            let pipeline = build_pipeline().await?;

            let run_id = RunId::new();
            let asset = stage_upload(&file, &pipeline.config().work_dir, &run_id)
                .await
                .context("failed to stage upload")?;

            let mut request = AnalyzeRequest::new(asset);
            request.run_id = run_id;
            if let Some(niche) = niche {
                request = request.with_niche(niche);
            }
            if let Some(platform) = platform {
                request = request.with_platform(platform);
            }
            if let Some(audience) = audience {
                request = request.with_audience(audience);
            }

            let code = if stream {
                stream_run(&pipeline, request).await?
            } else {
                let report = pipeline.analyze(request).await?;
                println!("{}", serde_json::to_string_pretty(&report)?);
                ExitCode::SUCCESS
            };

            pipeline.drain_cleanups().await;
            Ok(code)
        }
    }
}

async fn build_pipeline() -> anyhow::Result<Pipeline> {
    if let Ok(addr) = std::env::var("VSCORE_METRICS_ADDR") {
        let addr: SocketAddr = addr
            .parse()
            .with_context(|| format!("invalid VSCORE_METRICS_ADDR: {}", addr))?;
        init_metrics(addr)?;
        info!(%addr, "Metrics exporter listening");
    }

    let config = PipelineConfig::from_env();
    info!("Pipeline config: {:?}", config);

    let intel = Arc::new(IntelClient::from_env().context("video intelligence client")?);
    let genai = Arc::new(GeminiClient::from_env().context("generative model client")?);

    let registry =
        IndexRegistry::bootstrap(intel.clone(), config.retry.clone(), &config.index_name)
            .await
            .context("failed to resolve index")?;

    Ok(Pipeline::new(intel, genai, Arc::new(registry), config).await?)
}

async fn stream_run(pipeline: &Pipeline, request: AnalyzeRequest) -> anyhow::Result<ExitCode> {
    let mut events = pipeline.analyze_streaming(request);
    let mut code = ExitCode::FAILURE;

    while let Some(event) = events.recv().await {
        println!("{}", serde_json::to_string(&event)?);
        if event.is_terminal() {
            if event.kind == ProgressKind::Complete {
                code = ExitCode::SUCCESS;
            }
            break;
        }
    }

    Ok(code)
}
