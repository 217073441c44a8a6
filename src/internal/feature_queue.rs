use std::collections::VecDeque;

/// Bounded queue of embedding vectors, the input history of the keyword classifiers.
pub struct FeatureQueue {
    vectors: VecDeque<Vec<f32>>,
    max_len: usize,
    dim: usize,
}
impl FeatureQueue {
    pub fn new(max_len: usize, dim: usize) -> FeatureQueue {
        FeatureQueue {
            vectors: VecDeque::with_capacity(max_len),
            max_len,
            dim,
        }
    }
    pub fn push(&mut self, vector: Vec<f32>) -> Result<(), String> {
        if vector.len() != self.dim {
            return Err(format!("Embeddings should have {} values", self.dim));
        }
        if self.vectors.len() >= self.max_len {
            self.vectors.pop_front();
        }
        self.vectors.push_back(vector);
        Ok(())
    }
    /// The `n` most recent vectors, oldest first.
    pub fn latest(&self, n: usize) -> Option<Vec<&[f32]>> {
        if n == 0 || self.vectors.len() < n {
            return None;
        }
        Some(
            self.vectors
                .range(self.vectors.len() - n..)
                .map(|vector| &vector[..])
                .collect(),
        )
    }
    pub fn prefill(&mut self) {
        self.vectors.clear();
        self.vectors
            .extend((0..self.max_len).map(|_| vec![0.; self.dim]));
    }
    pub fn to_vec(&self) -> Vec<Vec<f32>> {
        self.vectors.iter().cloned().collect()
    }
    pub fn dim(&self) -> usize {
        self.dim
    }
    #[cfg(any(test, feature = "internals"))]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }
    pub fn clear(&mut self) {
        self.vectors.clear();
    }
}
