//! `meranti-portal` -- runs the mock generation simulator end to end.
//!
//! # Environment variables
//!
//! | Variable                    | Required | Default    | Description                        |
//! |-----------------------------|----------|------------|------------------------------------|
//! | `MERANTI_DATA_DIR`          | no       | `.meranti` | Where history JSON files are kept  |
//! | `MERANTI_LATENCY_SCALE`     | no       | `1.0`      | Latency multiplier, `0` = instant  |
//! | `MERANTI_LATENCY_JITTER_MS` | no       | `0`        | Max random extra delay per call    |
//! | `MERANTI_LOG_JSON`          | no       | `false`    | Log as JSON lines                  |

use std::sync::Arc;

use meranti_core::naming::display_timestamp;
use meranti_events::{EventBus, EventLogger};
use meranti_portal::config::PortalConfig;
use meranti_portal::demo::run_demo;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = match PortalConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let fmt_layer = if config.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "meranti_portal=info,meranti_simulator=info,meranti_events=info".into()),
        )
        .with(fmt_layer)
        .init();

    tracing::info!(
        data_dir = %config.data_dir.display(),
        latency_scale = config.latency_scale,
        jitter_ms = config.latency_jitter.as_millis() as u64,
        "Starting meranti-portal",
    );

    let bus = Arc::new(EventBus::default());
    let cancel = CancellationToken::new();
    let logger = tokio::spawn(EventLogger::run(bus.subscribe(), cancel.clone()));

    let result = run_demo(&config, Arc::clone(&bus)).await;

    cancel.cancel();
    let logged = logger.await.unwrap_or_default();

    match result {
        Ok(report) => {
            tracing::info!(
                image_job = %report.image_job.id,
                created = %display_timestamp(&report.image_job.created_at),
                images = report.image_job.output.result_urls.len(),
                seed = report.image_job.effective_seed,
                copy_job = %report.copy_job.id,
                trace_id = %report.answer.trace_id,
                ticket = %report.ticket.id,
                ticket_confidence = report.ticket_answer.confidence,
                sla_minutes = report.ticket.sla_minutes,
                history_len = report.history_len,
                events = logged,
                "Demo finished",
            );
            for inference in &report.inferences {
                match serde_json::to_string(inference) {
                    Ok(json) => tracing::info!(response = %json, "Inference response"),
                    Err(e) => tracing::warn!(error = %e, "Could not encode inference response"),
                }
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Demo failed");
            std::process::exit(1);
        }
    }
}
