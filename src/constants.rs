pub const DETECTOR_INTERNAL_SAMPLE_RATE: usize = 16000;
/// 80ms at 16kHz
pub const FRAME_LENGTH: usize = 1280;
pub const RAW_BUFFER_MAX_LEN: usize = FRAME_LENGTH * 2;
/// 25ms at 16kHz, the shortest span the spectral frontend is fed.
pub const MIN_LOOKBACK_SAMPLES: usize = 400;
pub const SPECTRAL_CONTEXT_SAMPLES: usize = 160 * 3;
pub const SPECTRAL_HISTORY_MAX_LEN: usize = 10 * 97;
pub const SPECTRAL_DEFAULT_SCALE: f32 = 0.1;
pub const SPECTRAL_DEFAULT_OFFSET: f32 = 2.0;
pub const SPECTRAL_PREFILL_VALUE: f32 = 1.0;
pub const WINDOW_FRAMES: usize = 76;
pub const FEATURE_QUEUE_MAX_LEN: usize = 120;
pub const MEL_BINS: usize = 32;
pub const MEL_FFT_LENGTH: usize = 512;
pub const MEL_HOP_LENGTH: usize = 160;
pub const MEL_MIN_POWER: f32 = 1e-10;
pub const LAST_AUDIO_SECONDS: usize = 3;
pub const LAST_AUDIO_RECORD_SUFFIX: &str = "_prediction.wav";
pub const BULK_DEFAULT_RATIO: f32 = 0.8;
pub const BULK_MAX_RATIO: f32 = 0.99;
pub const BULK_DEFAULT_MIN_SAMPLES: usize = 5000;
pub const DETECTOR_DEFAULT_FAKE_THRESHOLD_MARGIN: f32 = 0.1;
pub const DETECTOR_DEFAULT_MIN_INTERVAL_MS: u64 = 2000;
