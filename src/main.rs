use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use leadscore_api::{AppState, RestApi};
use leadscore_core::ScoringPipeline;
use leadscore_generator::LeadGenerator;

/// A demo lead-scoring service
#[derive(Parser, Debug)]
#[command(name = "leadscore")]
#[command(about = "Lead scoring API backed by a logistic regression model", long_about = None)]
struct Args {
    /// HTTP API port
    #[arg(long, default_value_t = 8000)]
    http_port: u16,

    /// Synthetic leads generated to train the model at startup
    #[arg(long, default_value_t = 1000)]
    training_records: usize,

    /// Leads per simulated live batch (/leads, /stats)
    #[arg(long, default_value_t = 50)]
    live_records: usize,

    /// Seed for the synthetic data; random when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn generator(n_records: usize, seed: Option<u64>) -> LeadGenerator {
    match seed {
        Some(seed) => LeadGenerator::with_seed(n_records, seed),
        None => LeadGenerator::new(n_records),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting LeadScore v{}", env!("CARGO_PKG_VERSION"));
    info!("HTTP API port: {}", args.http_port);

    let pipeline = Arc::new(ScoringPipeline::new());
    let records = generator(args.training_records, args.seed).generate();
    let trainer = pipeline.clone();
    let evaluation = tokio::task::spawn_blocking(move || trainer.train(&records)).await??;
    info!("Startup training done, held-out accuracy {:.4}", evaluation.accuracy);

    let live = generator(args.live_records, args.seed.map(|s| s.wrapping_add(1)));
    let state = Arc::new(AppState::new(pipeline, live));

    let http_port = args.http_port;
    let http_handle = std::thread::spawn(move || {
        info!("Starting HTTP server on port {}", http_port);
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(state, http_port).await {
                tracing::error!("HTTP server error: {}", e);
            }
        })
    });

    info!("LeadScore started successfully");
    info!("HTTP API: http://localhost:{}/", args.http_port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = tokio::task::spawn_blocking(move || {
            http_handle.join().ok();
        }) => {
            info!("HTTP server stopped");
        }
    }

    info!("Shutting down...");
    Ok(())
}
