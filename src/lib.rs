mod clock;
mod config;
mod constants;
mod detector;
mod inference;
mod internal;
mod keyword;
mod scheduler;
pub use clock::Clock;
pub use clock::SystemClock;
pub use config::BulkConfig;
pub use config::DetectorConfig;
pub use config::PipelineConfig;
pub use config::SpotterConfig;
#[cfg(feature = "internals")]
pub use constants::DETECTOR_INTERNAL_SAMPLE_RATE;
#[cfg(feature = "internals")]
pub use constants::FRAME_LENGTH;
#[cfg(feature = "internals")]
pub use constants::WINDOW_FRAMES;
pub use detector::AudioTap;
pub use detector::KeywordSpotter;
pub use detector::StopHandle;
pub use inference::EmbeddingModel;
pub use inference::KeywordClassifier;
pub use inference::SpectralFrontend;
pub use inference::SpectralWindow;
#[cfg(feature = "internals")]
pub use internal::FeatureQueue;
#[cfg(feature = "internals")]
pub use internal::LastAudioRing;
pub use internal::MelSpectrogram;
#[cfg(feature = "internals")]
pub use internal::RawAudioRing;
#[cfg(feature = "internals")]
pub use internal::SpectralHistory;
pub use keyword::KeywordModel;
pub use keyword::SpotterDetection;
