//! One-shot pipeline runner.
//!
//! ```text
//! vdub-worker tts                 # synthesize speech for every sheet row
//! vdub-worker video <row.json>    # dub one row (a JSON job row or push envelope)
//! ```

use std::path::Path;

use tracing::{error, info};

use vdub_models::{JobRow, PushEnvelope};
use vdub_worker::logging::init_tracing;
use vdub_worker::{Pipeline, WorkerError, WorkerResult};

const USAGE: &str = "usage: vdub-worker <tts | video ROW_JSON_FILE>";

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("rustls crypto provider was already installed");
    }

    dotenvy::dotenv().ok();
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str);

    if !matches!(command, Some("tts") | Some("video")) {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    }

    info!("Starting vdub-worker {}", command.unwrap_or_default());

    let pipeline = match Pipeline::from_env().await {
        Ok(p) => p,
        Err(e) => {
            error!("Failed to configure pipeline: {}", e);
            std::process::exit(1);
        }
    };

    let result = match command {
        Some("tts") => {
            let report = pipeline.tts.run().await;
            println!("{}", serde_json::to_string(&report).unwrap_or_default());
            Ok(())
        }
        _ => run_video(&pipeline, args.get(1)).await,
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run_video(pipeline: &Pipeline, file: Option<&String>) -> WorkerResult<()> {
    let file = file.ok_or_else(|| WorkerError::invalid_job(USAGE))?;
    let row = read_row(Path::new(file)).await?;

    let row = pipeline.video.run(row).await;
    println!(
        "{}",
        serde_json::json!({
            "status": row.status,
            "final_video_file_url": row.final_video_file_url,
        })
    );
    Ok(())
}

/// A row file holds either a job row or a whole push envelope.
async fn read_row(path: &Path) -> WorkerResult<JobRow> {
    let bytes = tokio::fs::read(path).await?;
    let value: serde_json::Value = serde_json::from_slice(&bytes)?;

    if value.get("message").is_some() {
        let envelope: PushEnvelope = serde_json::from_value(value)?;
        Ok(envelope.decode_json()?)
    } else {
        Ok(serde_json::from_value(value)?)
    }
}
