use std::sync::Arc;

use meranti_core::inference::InferenceResponse;
use meranti_core::job::JobStatus;
use meranti_events::EventBus;
use meranti_portal::config::PortalConfig;
use meranti_portal::demo::run_demo;
use meranti_simulator::store::JOB_HISTORY_FILE;

fn instant_config(dir: &std::path::Path) -> PortalConfig {
    PortalConfig {
        data_dir: dir.to_path_buf(),
        latency_scale: 0.0,
        ..PortalConfig::default()
    }
}

#[tokio::test]
async fn demo_runs_every_screen() {
    let dir = tempfile::tempdir().unwrap();
    let config = instant_config(dir.path());

    let report = run_demo(&config, Arc::new(EventBus::default())).await.unwrap();

    assert_eq!(report.image_job.status, JobStatus::Done);
    assert_eq!(report.image_job.output.result_urls.len(), 4);
    assert_eq!(report.copy_job.status, JobStatus::Done);
    assert_eq!(report.ticket.sla_minutes, 120);
    assert_eq!(report.answer.citations.len(), 2);
    assert_eq!(report.ticket_answer.confidence, 0.86);
    assert_eq!(report.history_len, 2);
    assert!(matches!(report.inferences[0], InferenceResponse::Text { .. }));
    assert!(matches!(
        report.inferences[1],
        InferenceResponse::Image { seed: 20_251_029, .. }
    ));
    assert!(dir.path().join(JOB_HISTORY_FILE).exists());
}

#[tokio::test]
async fn history_accumulates_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let config = instant_config(dir.path());

    run_demo(&config, Arc::new(EventBus::default())).await.unwrap();
    let second = run_demo(&config, Arc::new(EventBus::default())).await.unwrap();

    assert_eq!(second.history_len, 4);
}
