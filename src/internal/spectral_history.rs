use std::collections::VecDeque;

use crate::SpectralWindow;

/// Bounded history of spectral rows, oldest rows are dropped first.
pub struct SpectralHistory {
    rows: VecDeque<Vec<f32>>,
    max_len: usize,
    width: usize,
}
impl SpectralHistory {
    pub fn new(max_len: usize, width: usize) -> SpectralHistory {
        SpectralHistory {
            rows: VecDeque::with_capacity(max_len + 1),
            max_len,
            width,
        }
    }
    pub fn append(&mut self, rows: Vec<Vec<f32>>) -> Result<(), String> {
        if rows.iter().any(|row| row.len() != self.width) {
            return Err(format!(
                "Spectral rows should have {} values",
                self.width
            ));
        }
        self.rows.extend(rows);
        if self.rows.len() > self.max_len {
            self.rows.drain(0..self.rows.len() - self.max_len);
        }
        Ok(())
    }
    /// Last `window_frames` rows, oldest first.
    pub fn latest_window(&self, window_frames: usize) -> Option<SpectralWindow> {
        if window_frames == 0 || self.rows.len() < window_frames {
            return None;
        }
        Some(
            self.rows
                .range(self.rows.len() - window_frames..)
                .cloned()
                .collect(),
        )
    }
    /// Seeds the history with `count` rows filled with `value`.
    pub fn prefill(&mut self, count: usize, value: f32) {
        let count = count.min(self.max_len);
        self.rows.clear();
        self.rows
            .extend((0..count).map(|_| vec![value; self.width]));
    }
    pub fn width(&self) -> usize {
        self.width
    }
    pub fn len(&self) -> usize {
        self.rows.len()
    }
    pub fn clear(&mut self) {
        self.rows.clear();
    }
}
