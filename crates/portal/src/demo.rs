//! Scripted walkthrough of every portal screen against the mock backend.

use std::sync::Arc;

use meranti_core::chat::{Answer, KnowledgeDomain};
use meranti_core::content::filter_templates;
use meranti_core::inference::{InferenceModel, InferenceRequest, InferenceResponse};
use meranti_core::job::Job;
use meranti_core::ticket::{Ticket, TicketDraft};
use meranti_events::bus::EventBus;
use meranti_simulator::latency::LatencySimulator;
use meranti_simulator::store::{JsonLogFile, CONVERSATIONS_FILE, JOB_HISTORY_FILE};
use meranti_simulator::{
    AnswerMode, GenerationBackend, MockBackend, QaSession, Studio, StudioError, TicketDesk,
};

use crate::config::PortalConfig;

/// What a demo run produced.
#[derive(Debug)]
pub struct DemoReport {
    pub image_job: Job,
    pub copy_job: Job,
    pub answer: Answer,
    pub ticket: Ticket,
    pub ticket_answer: Answer,
    pub inferences: Vec<InferenceResponse>,
    pub history_len: usize,
}

/// Run one image job, one copy job, a Q&A exchange, a ticket and both
/// inference calls. State is persisted under `config.data_dir`.
pub async fn run_demo(config: &PortalConfig, bus: Arc<EventBus>) -> Result<DemoReport, StudioError> {
    let backend: Arc<dyn GenerationBackend> =
        Arc::new(MockBackend::new(LatencySimulator::new(config.latency_profile())));

    // Image studio
    let studio = Studio::with_history_file(
        Arc::clone(&backend),
        Arc::clone(&bus),
        JsonLogFile::new(config.data_dir.join(JOB_HISTORY_FILE)),
    );
    studio.choose_preset("ioh_sunset").await?;
    studio
        .update_form(|form| {
            form.prompt = "IOH sunset poster, eSIM promo, Jakarta skyline".to_string();
            form.count = 4.0;
        })
        .await;
    let image_job = studio.submit_image().await?.wait().await?;

    // Content generation
    let template = filter_templates("social")
        .first()
        .map(|t| t.id)
        .unwrap_or("post-id");
    studio.choose_template(template).await?;
    let copy_job = studio.submit_copy().await?.wait().await?;

    // Knowledge-base Q&A
    let qa = QaSession::with_file(
        Arc::clone(&backend),
        Arc::clone(&bus),
        AnswerMode::KnowledgeBase,
        KnowledgeDomain::Net,
        JsonLogFile::new(config.data_dir.join(CONVERSATIONS_FILE)),
    );
    qa.new_chat().await;
    let answer = qa.send("Why did DNS SERVFAIL spike in Jakarta?").await?;

    // Ticketing
    let desk = TicketDesk::new(Arc::clone(&backend), Arc::clone(&bus));
    let draft = desk
        .suggest(&TicketDraft {
            severity: "P2".to_string(),
            ..TicketDraft::default()
        })
        .await?;
    let ticket = desk.submit(&draft).await?;
    let ticket_answer = desk.ask_ai(&ticket.id, "").await?;

    // Inference console
    let mut inferences = Vec::new();
    for model in [InferenceModel::Llama, InferenceModel::Diffusion] {
        let request = InferenceRequest {
            model,
            prompt: String::new(),
        };
        inferences.push(backend.infer(&request).await?);
    }

    Ok(DemoReport {
        image_job,
        copy_job,
        answer,
        ticket,
        ticket_answer,
        inferences,
        history_len: studio.history().await.len(),
    })
}
