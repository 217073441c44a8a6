mod feature_queue;
mod last_audio_ring;
mod mel_spectrogram;
mod raw_audio_ring;
mod spectral_history;
pub use feature_queue::FeatureQueue;
pub use last_audio_ring::LastAudioRing;
pub use mel_spectrogram::MelSpectrogram;
pub use raw_audio_ring::RawAudioRing;
pub use spectral_history::SpectralHistory;
