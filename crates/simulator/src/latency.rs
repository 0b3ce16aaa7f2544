//! Simulated backend latency.
//!
//! Every kind of simulated work waits for a fixed base duration, scaled by
//! [`LatencyProfile::scale`] and extended by up to
//! [`LatencyProfile::jitter`]. A scale of `0` makes every wait instant.

use std::time::Duration;

use meranti_core::job::JobKind;
use rand::Rng;
use tokio_util::sync::CancellationToken;

/// Upper bound accepted for the latency scale.
pub const MAX_SCALE: f64 = 100.0;

/// Latency bucket of a piece of simulated work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LatencyKind {
    CopyText,
    CopyImage,
    ImageBatch,
    QaAnswer,
    OpsAnswer,
    Inference,
    TicketSuggest,
    TicketAnswer,
}

impl LatencyKind {
    /// Unscaled duration of this kind of work.
    pub fn base(&self) -> Duration {
        let ms = match self {
            Self::CopyText => 800,
            Self::CopyImage => 1600,
            Self::ImageBatch => 1200,
            Self::QaAnswer => 500,
            Self::OpsAnswer => 600,
            Self::Inference => 1000,
            Self::TicketSuggest => 500,
            Self::TicketAnswer => 800,
        };
        Duration::from_millis(ms)
    }
}

impl From<JobKind> for LatencyKind {
    fn from(kind: JobKind) -> Self {
        match kind {
            JobKind::ImageBatch => Self::ImageBatch,
            JobKind::CopyText => Self::CopyText,
            JobKind::CopyImage => Self::CopyImage,
        }
    }
}

/// Tunable latency parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyProfile {
    /// Multiplier applied to every base duration, in `[0, MAX_SCALE]`.
    scale: f64,
    /// Maximum extra delay, drawn uniformly per wait.
    jitter: Duration,
}

impl Default for LatencyProfile {
    fn default() -> Self {
        Self {
            scale: 1.0,
            jitter: Duration::ZERO,
        }
    }
}

impl LatencyProfile {
    /// A profile with the given scale. NaN is treated as `1.0`; other
    /// values are clamped to `[0, MAX_SCALE]`.
    pub fn with_scale(scale: f64) -> Self {
        let scale = if scale.is_nan() {
            1.0
        } else {
            scale.clamp(0.0, MAX_SCALE)
        };
        Self {
            scale,
            ..Self::default()
        }
    }

    /// No waiting at all.
    pub fn instant() -> Self {
        Self::with_scale(0.0)
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn jitter(&self) -> Duration {
        self.jitter
    }

    /// The delay a single wait of `kind` will take.
    pub fn delay_for(&self, kind: LatencyKind) -> Duration {
        let base = kind.base().mul_f64(self.scale);
        if self.jitter.is_zero() {
            return base;
        }
        let extra_ms = rand::rng().random_range(0..=self.jitter.as_millis() as u64);
        base + Duration::from_millis(extra_ms)
    }
}

/// Returned when a wait is cancelled before it elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("simulated work cancelled")]
pub struct Cancelled;

/// Sleeps for the configured latency of each kind of work.
#[derive(Debug, Clone, Default)]
pub struct LatencySimulator {
    profile: LatencyProfile,
}

impl LatencySimulator {
    pub fn new(profile: LatencyProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &LatencyProfile {
        &self.profile
    }

    /// Wait out the latency of `kind`, returning how long was waited.
    ///
    /// Always completes unless the future is dropped.
    pub async fn simulate(&self, kind: LatencyKind) -> Duration {
        let delay = self.profile.delay_for(kind);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        tracing::trace!(?kind, delay_ms = delay.as_millis() as u64, "Simulated latency elapsed");
        delay
    }

    /// Like [`simulate`](Self::simulate), but gives up when `cancel` fires.
    pub async fn simulate_until(
        &self,
        kind: LatencyKind,
        cancel: &CancellationToken,
    ) -> Result<Duration, Cancelled> {
        tokio::select! {
            _ = cancel.cancelled() => Err(Cancelled),
            waited = self.simulate(kind) => Ok(waited),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_and_image_buckets() {
        assert_eq!(LatencyKind::CopyText.base(), Duration::from_millis(800));
        assert_eq!(LatencyKind::CopyImage.base(), Duration::from_millis(1600));
        assert_eq!(LatencyKind::ImageBatch.base(), Duration::from_millis(1200));
        assert_eq!(LatencyKind::from(JobKind::ImageBatch), LatencyKind::ImageBatch);
    }

    #[test]
    fn scale_multiplies_base() {
        let profile = LatencyProfile::with_scale(0.5);
        assert_eq!(profile.delay_for(LatencyKind::ImageBatch), Duration::from_millis(600));
        assert_eq!(LatencyProfile::instant().delay_for(LatencyKind::CopyImage), Duration::ZERO);
    }

    #[test]
    fn scale_is_sanitized() {
        assert_eq!(LatencyProfile::with_scale(-3.0).scale(), 0.0);
        assert_eq!(LatencyProfile::with_scale(f64::NAN).scale(), 1.0);
        assert_eq!(LatencyProfile::with_scale(1e9).scale(), MAX_SCALE);
        assert_eq!(
            LatencyProfile::with_scale(-1.0).delay_for(LatencyKind::QaAnswer),
            Duration::ZERO
        );
    }

    #[test]
    fn jitter_stays_within_bound() {
        let profile = LatencyProfile::default().with_jitter(Duration::from_millis(50));
        for _ in 0..200 {
            let d = profile.delay_for(LatencyKind::QaAnswer);
            assert!(d >= Duration::from_millis(500));
            assert!(d <= Duration::from_millis(550));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn simulate_waits_the_bucket() {
        let sim = LatencySimulator::default();
        let start = tokio::time::Instant::now();
        let waited = sim.simulate(LatencyKind::CopyText).await;
        assert_eq!(waited, Duration::from_millis(800));
        assert!(start.elapsed() >= Duration::from_millis(800));
    }

    #[tokio::test(start_paused = true)]
    async fn simulate_until_completes_without_cancel() {
        let sim = LatencySimulator::default();
        let waited = sim
            .simulate_until(LatencyKind::TicketAnswer, &CancellationToken::new())
            .await;
        assert_eq!(waited, Ok(Duration::from_millis(800)));
    }

    #[tokio::test(start_paused = true)]
    async fn simulate_until_honours_cancel() {
        let sim = LatencySimulator::default();
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert_eq!(
            sim.simulate_until(LatencyKind::ImageBatch, &cancel).await,
            Err(Cancelled)
        );
    }
}
