/// Consecutive spectral rows consumed by the embedding model, oldest first.
pub type SpectralWindow = Vec<Vec<f32>>;

/// Converts raw samples into spectral rows (time x frequency bins).
///
/// The spotter hands it the latest frame plus some look-back samples. Returning zero rows is
/// fine, it's read as "not enough data yet". An error is logged and treated the same way.
pub trait SpectralFrontend: Send {
    /// Width of every row returned by [`SpectralFrontend::compute`].
    fn feature_size(&self) -> usize;
    fn compute(&mut self, samples: &[i16]) -> Result<Vec<Vec<f32>>, String>;
}

/// Converts spectral windows into embedding vectors.
///
/// Must return exactly one vector of [`EmbeddingModel::embedding_size`] values per input
/// window, in input order. Batching must not change the result of any single window.
pub trait EmbeddingModel: Send {
    fn embedding_size(&self) -> usize;
    fn embed(&mut self, windows: &[SpectralWindow]) -> Result<Vec<Vec<f32>>, String>;
}

/// Scores the most recent embeddings for one keyword.
pub trait KeywordClassifier: Send {
    /// Number of embedding vectors the model takes, oldest first.
    fn input_frames(&self) -> usize;
    /// Returns a confidence in range 0 - 1.
    fn classify(&mut self, features: &[&[f32]]) -> Result<f32, String>;
}
