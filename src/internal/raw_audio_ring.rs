/// Fixed-size ring of the latest raw samples, read back by the spectral frontend.
pub struct RawAudioRing {
    buffer: Box<[i16]>,
    write_pos: usize,
    len: usize,
    min_lookback: usize,
}
impl RawAudioRing {
    pub fn new(capacity: usize, min_lookback: usize) -> RawAudioRing {
        RawAudioRing {
            buffer: vec![0; capacity].into_boxed_slice(),
            write_pos: 0,
            len: 0,
            min_lookback,
        }
    }
    /// Appends samples, overwriting the oldest ones once the ring is full.
    pub fn push(&mut self, samples: &[i16]) {
        let capacity = self.buffer.len();
        if capacity == 0 {
            return;
        }
        // only the tail of an oversized push can survive
        let samples = if samples.len() > capacity {
            &samples[samples.len() - capacity..]
        } else {
            samples
        };
        for &sample in samples {
            self.buffer[self.write_pos] = sample;
            self.write_pos = (self.write_pos + 1) % capacity;
        }
        self.len = (self.len + samples.len()).min(capacity);
    }
    /// Copies out the last `n` samples (or all of them if fewer are buffered), oldest first.
    /// Returns `None` until the min look-back has been buffered.
    pub fn snapshot(&self, n: usize) -> Option<Vec<i16>> {
        if self.len < self.min_lookback {
            return None;
        }
        let capacity = self.buffer.len();
        let n = n.min(self.len);
        let start = (self.write_pos + capacity - n) % capacity;
        Some(
            (0..n)
                .map(|i| self.buffer[(start + i) % capacity])
                .collect(),
        )
    }
    pub fn len(&self) -> usize {
        self.len
    }
    #[cfg(any(test, feature = "internals"))]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }
    pub fn clear(&mut self) {
        self.buffer.iter_mut().for_each(|sample| *sample = 0);
        self.write_pos = 0;
        self.len = 0;
    }
}
