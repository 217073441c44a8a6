use crate::constants::{
    BULK_DEFAULT_MIN_SAMPLES, BULK_DEFAULT_RATIO, BULK_MAX_RATIO,
    DETECTOR_DEFAULT_FAKE_THRESHOLD_MARGIN, FEATURE_QUEUE_MAX_LEN, FRAME_LENGTH,
    MIN_LOOKBACK_SAMPLES, RAW_BUFFER_MAX_LEN, SPECTRAL_CONTEXT_SAMPLES, SPECTRAL_DEFAULT_OFFSET,
    SPECTRAL_DEFAULT_SCALE, SPECTRAL_HISTORY_MAX_LEN, WINDOW_FRAMES,
};
/// Configures the buffer layout of the streaming pipeline.
#[cfg_attr(feature = "debug", derive(Debug))]
#[derive(Clone)]
pub struct PipelineConfig {
    /// Number of samples per frame (the ingestion stride).
    pub frame_length: usize,
    /// Capacity in samples of the raw audio ring that feeds the spectral frontend.
    pub raw_buffer_len: usize,
    /// Minimum number of buffered samples before the spectral frontend is run.
    pub min_lookback: usize,
    /// Extra look-back samples handed to the spectral frontend on top of each frame.
    pub spectral_context: usize,
    /// Max number of spectral rows retained.
    pub spectral_history_len: usize,
    /// Number of spectral rows per window.
    pub window_frames: usize,
    /// Max number of embedding vectors retained for the classifiers.
    pub feature_queue_len: usize,
    /// Scale applied to every spectral value returned by the frontend.
    pub spectral_scale: f32,
    /// Offset added to every spectral value after scaling.
    pub spectral_offset: f32,
    /// Seed the spectral history and feature queue so classifiers can run from the first frame.
    pub prefill: bool,
}
impl Default for PipelineConfig {
    fn default() -> PipelineConfig {
        PipelineConfig {
            frame_length: FRAME_LENGTH,
            raw_buffer_len: RAW_BUFFER_MAX_LEN,
            min_lookback: MIN_LOOKBACK_SAMPLES,
            spectral_context: SPECTRAL_CONTEXT_SAMPLES,
            spectral_history_len: SPECTRAL_HISTORY_MAX_LEN,
            window_frames: WINDOW_FRAMES,
            feature_queue_len: FEATURE_QUEUE_MAX_LEN,
            spectral_scale: SPECTRAL_DEFAULT_SCALE,
            spectral_offset: SPECTRAL_DEFAULT_OFFSET,
            prefill: true,
        }
    }
}
impl PipelineConfig {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.frame_length == 0 {
            Err("Frame length should be greater than zero".to_string())
        } else if self.min_lookback == 0 {
            Err("Min look-back should be greater than zero".to_string())
        } else if self.raw_buffer_len < self.frame_length * 2
            || self.raw_buffer_len < self.frame_length + self.spectral_context
            || self.raw_buffer_len < self.min_lookback
        {
            Err("Raw buffer should hold two frames, the spectral context and the min look-back"
                .to_string())
        } else if self.window_frames == 0 {
            Err("Window size should be greater than zero".to_string())
        } else if self.spectral_history_len < self.window_frames {
            Err("Spectral history should hold at least one window".to_string())
        } else if self.feature_queue_len == 0 {
            Err("Feature queue length should be greater than zero".to_string())
        } else if !self.spectral_scale.is_finite() || !self.spectral_offset.is_finite() {
            Err("Spectral normalization should be finite".to_string())
        } else {
            Ok(())
        }
    }
}
/// Configures the bulk head / streaming tail split used when large pushes arrive.
#[cfg_attr(feature = "debug", derive(Debug))]
#[derive(Clone, Copy)]
pub struct BulkConfig {
    /// Enables batching the embeddings of the leading part of a large push.
    pub enabled: bool,
    /// Fraction of each eligible push ingested as head (range 0 - 0.99).
    pub ratio: f32,
    /// Min samples a push needs to be eligible. Never lower than two frames.
    pub min_samples: usize,
}
impl Default for BulkConfig {
    fn default() -> BulkConfig {
        BulkConfig {
            enabled: true,
            ratio: BULK_DEFAULT_RATIO,
            min_samples: BULK_DEFAULT_MIN_SAMPLES,
        }
    }
}
impl BulkConfig {
    /// Returns a copy with the ratio and min samples moved into their valid ranges.
    pub(crate) fn clamped(self, frame_length: usize) -> BulkConfig {
        let ratio = if self.ratio.is_nan() {
            0.
        } else {
            self.ratio.clamp(0., BULK_MAX_RATIO)
        };
        BulkConfig {
            enabled: self.enabled,
            ratio,
            min_samples: self.min_samples.max(frame_length * 2),
        }
    }
}
/// Configures the detection behavior.
#[cfg_attr(feature = "debug", derive(Debug))]
#[derive(Clone)]
pub struct DetectorConfig {
    /// Distance below each keyword threshold where the fast-reject (fake) threshold sits.
    pub fake_threshold_margin: f32,
    /// Run every collaborator once on silence when listening starts.
    pub warmup: bool,
    /// Directory where the last seconds of audio are dumped on each detection. No dump is
    /// written when unset, [`crate::KeywordSpotter::last_audio_wav`] still returns it.
    pub record_path: Option<String>,
}
impl Default for DetectorConfig {
    fn default() -> DetectorConfig {
        DetectorConfig {
            fake_threshold_margin: DETECTOR_DEFAULT_FAKE_THRESHOLD_MARGIN,
            warmup: true,
            record_path: None,
        }
    }
}
impl DetectorConfig {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if !self.fake_threshold_margin.is_finite() || self.fake_threshold_margin < 0. {
            Err("Fake threshold margin should be a positive number".to_string())
        } else {
            Ok(())
        }
    }
}
/// Encapsulates all the tool configurations.
#[cfg_attr(feature = "debug", derive(Debug))]
#[derive(Clone, Default)]
pub struct SpotterConfig {
    /// Configures the buffers and windowing.
    pub pipeline: PipelineConfig,
    /// Configures the ingestion of large pushes.
    pub bulk: BulkConfig,
    /// Configures detection.
    pub detector: DetectorConfig,
}
