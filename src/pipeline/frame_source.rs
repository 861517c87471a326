//! Frame source abstraction for the extraction stage.
//!
//! The real decoder lives outside the core; the pipeline consumes it
//! through [`FrameSource`]: given a video handle and a frame budget,
//! produce evenly-spaced decoded frames or fail. The bundled
//! [`SimulatedFrameSource`] honours the full contract (frame count,
//! spacing, error taxonomy, per-frame cancellation checkpoint) with
//! synthetic bitmaps.

use anyhow::Result;
use async_trait::async_trait;
use rand::Rng;
use tokio_util::sync::CancellationToken;

use super::types::{Bitmap, Frame, PipelineError, VideoHandle};

/// Trait abstracting where decoded frames come from.
///
/// Implementations must return exactly
/// `min(frame_budget, floor(duration_seconds))` frames, evenly spaced
/// over the clip, and check `cancel` once per frame. Errors are
/// classified by the runner via downcast to
/// [`PipelineError`]; anything else maps to an internal inconsistency.
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Decode up to `frame_budget` frames from `video`.
    async fn extract(
        &self,
        video: &VideoHandle,
        frame_budget: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<Frame>>;

    /// Human-readable name for logging (e.g. "simulated", "avfoundation").
    fn source_name(&self) -> &str;
}

/// Simulated decoder producing synthetic bitmaps.
///
/// Frame timing and count follow the real decoder contract exactly; only
/// the pixel content is fake. An optional per-frame delay stands in for
/// decode cost, which also gives cancellation its checkpoint cadence.
pub struct SimulatedFrameSource {
    frame_delay: std::time::Duration,
    width: u32,
    height: u32,
}

impl SimulatedFrameSource {
    pub fn new() -> Self {
        Self {
            frame_delay: std::time::Duration::ZERO,
            width: 64,
            height: 64,
        }
    }

    /// Simulate per-frame decode cost.
    #[must_use]
    pub fn with_frame_delay(mut self, delay: std::time::Duration) -> Self {
        self.frame_delay = delay;
        self
    }

    fn synthesize_bitmap(&self, index: u32) -> Bitmap {
        let mut rng = rand::thread_rng();
        let mut data = vec![0u8; (self.width * self.height) as usize];
        // Base shade walks with the frame index so frames are distinguishable.
        let base = (index % 200) as u8;
        for px in &mut data {
            *px = base.saturating_add(rng.gen_range(0..32));
        }
        Bitmap {
            width: self.width,
            height: self.height,
            data,
        }
    }
}

impl Default for SimulatedFrameSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FrameSource for SimulatedFrameSource {
    async fn extract(
        &self,
        video: &VideoHandle,
        frame_budget: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<Frame>> {
        if frame_budget == 0 {
            return Err(PipelineError::InvalidInput.into());
        }

        let duration = video.duration_seconds;
        if duration <= 0.0 {
            return Err(PipelineError::ExtractFramesFailed.into());
        }

        let count = frame_budget.min(duration.floor() as u32);
        let mut frames = Vec::with_capacity(count as usize);

        for i in 0..count {
            if cancel.is_cancelled() {
                return Err(PipelineError::Cancelled.into());
            }

            if !self.frame_delay.is_zero() {
                tokio::time::sleep(self.frame_delay).await;
            }

            let timestamp_seconds = f64::from(i) * (duration / f64::from(count));
            frames.push(Frame {
                index: i,
                timestamp_seconds,
                image: self.synthesize_bitmap(i),
            });
        }

        Ok(frames)
    }

    fn source_name(&self) -> &str {
        "simulated"
    }
}
