//! Rendering adapter: decoded still images, watermarks, framing and preview
//! frames.

use crate::core::error::{RetroError, RetroResult};
use crate::core::types::Image;
use crate::execution::engine::{FilterPipeline, RenderStatus};
use crate::filters::builtin::{apply_frame, apply_watermark, FrameStyle, WatermarkType};
use crate::filters::styles::{normalize_id, FilterStyle};
use image::DynamicImage;
use std::time::{Duration, Instant};

/// Default preview cadence, about 15 frames per second.
pub const DEFAULT_PREVIEW_INTERVAL: Duration = Duration::from_millis(66);

/// What to do with a still image.
#[derive(Debug, Clone, PartialEq)]
pub struct StillRequest {
    /// Style id (built-in or custom).
    pub style: String,
    /// Blend intensity.
    pub intensity: f32,
    /// Frame drawn around the filtered photo.
    pub frame: FrameStyle,
    /// Frame and watermark size multiplier.
    pub frame_scale: f32,
    /// Watermark stamped onto the photo.
    pub watermark: WatermarkType,
    /// Text of [`WatermarkType::CustomText`].
    pub watermark_text: String,
}

impl Default for StillRequest {
    fn default() -> Self {
        Self {
            style: FilterStyle::None.id().to_string(),
            intensity: 1.0,
            frame: FrameStyle::None,
            frame_scale: 1.0,
            watermark: WatermarkType::None,
            watermark_text: String::new(),
        }
    }
}

impl StillRequest {
    /// Create a request for `style` at full intensity, without a frame.
    pub fn new(style: impl Into<String>) -> Self {
        Self {
            style: style.into(),
            ..Self::default()
        }
    }

    /// Set the intensity.
    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity;
        self
    }

    /// Set the frame and its scale.
    pub fn with_frame(mut self, frame: FrameStyle, scale: f32) -> Self {
        self.frame = frame;
        self.frame_scale = scale;
        self
    }

    /// Set the watermark. `text` is only used by
    /// [`WatermarkType::CustomText`].
    pub fn with_watermark(mut self, watermark: WatermarkType, text: impl Into<String>) -> Self {
        self.watermark = watermark;
        self.watermark_text = text.into();
        self
    }
}

/// A rendered still image.
#[derive(Debug, Clone)]
pub struct StillOutput {
    /// 8-bit RGBA result.
    pub image: DynamicImage,
    /// Complete or degraded.
    pub status: RenderStatus,
}

impl FilterPipeline {
    /// Filter a decoded still image with a built-in style.
    ///
    /// The result is 8-bit RGBA with the input's dimensions.
    pub fn apply_to_dynamic(&self, image: &DynamicImage, style: FilterStyle, intensity: f32) -> DynamicImage {
        let input = Image::from_dynamic(image);
        self.apply_style_with_intensity(&input, style, intensity).to_dynamic()
    }

    /// Filter, watermark and frame a decoded still image.
    ///
    /// The watermark is drawn inside the photo area, then the frame is
    /// added around it. Unlike the `apply_*` entry points, an unknown style
    /// id or an oversized frame is an error here, so that batch jobs and
    /// the CLI can report it.
    pub fn render_still(&self, image: &DynamicImage, request: &StillRequest) -> RetroResult<StillOutput> {
        let id = normalize_id(&request.style);
        let input = Image::from_dynamic(image);
        let output = self
            .render_named(&input, &id, request.intensity)
            .ok_or_else(|| RetroError::UnknownStyle(request.style.clone()))?;
        if output.status.is_degraded() {
            log::warn!(
                "style '{}' rendered with {} skipped stage(s)",
                id,
                output.status.failures().len()
            );
        }
        let stamped = apply_watermark(
            &output.image,
            request.watermark,
            &request.watermark_text,
            request.frame_scale,
        );
        let framed = apply_frame(&stamped, request.frame, request.frame_scale)?;
        Ok(StillOutput {
            image: framed.to_dynamic(),
            status: output.status,
        })
    }
}

/// Admits at most one preview frame per interval and drops the rest.
///
/// Lives with the caller (camera loop); the pipeline itself never rate
/// limits.
#[derive(Debug, Clone)]
pub struct PreviewThrottle {
    interval: Duration,
    last: Option<Instant>,
    admitted: u64,
    dropped: u64,
}

impl Default for PreviewThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_PREVIEW_INTERVAL)
    }
}

impl PreviewThrottle {
    /// Create a throttle with the given minimum spacing between frames.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
            admitted: 0,
            dropped: 0,
        }
    }

    /// Create a throttle for a target frame rate. Non-positive rates admit
    /// every frame; rates too small for a [`Duration`] admit only the first.
    pub fn from_fps(fps: f32) -> Self {
        if !(fps.is_finite() && fps > 0.0) {
            return Self::new(Duration::ZERO);
        }
        Self::new(Duration::try_from_secs_f32(1.0 / fps).unwrap_or(Duration::MAX))
    }

    /// Minimum spacing between admitted frames.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether a frame arriving now should be processed.
    pub fn admit(&mut self) -> bool {
        self.admit_at(Instant::now())
    }

    /// Whether a frame arriving at `now` should be processed.
    pub fn admit_at(&mut self, now: Instant) -> bool {
        let ready = match self.last {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        };
        if ready {
            self.last = Some(now);
            self.admitted += 1;
        } else {
            self.dropped += 1;
        }
        ready
    }

    /// Filter `frame` if the throttle admits it at `now`.
    pub fn filter_frame_at(
        &mut self,
        pipeline: &FilterPipeline,
        frame: &Image,
        style: FilterStyle,
        now: Instant,
    ) -> Option<Image> {
        if self.admit_at(now) {
            Some(pipeline.apply_style_to_frame(frame, style))
        } else {
            None
        }
    }

    /// Filter `frame` if the throttle admits it now.
    pub fn filter_frame(&mut self, pipeline: &FilterPipeline, frame: &Image, style: FilterStyle) -> Option<Image> {
        self.filter_frame_at(pipeline, frame, style, Instant::now())
    }

    /// Number of admitted frames.
    pub fn admitted(&self) -> u64 {
        self.admitted
    }

    /// Number of dropped frames.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Forget the last admitted frame and the counters.
    pub fn reset(&mut self) {
        self.last = None;
        self.admitted = 0;
        self.dropped = 0;
    }
}
