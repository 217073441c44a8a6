use log::debug;

use crate::{constants::DETECTOR_DEFAULT_MIN_INTERVAL_MS, KeywordClassifier};

/// A keyword to spot, with its classifier and detection parameters.
pub struct KeywordModel {
    /// Keyword name, reported on detection. Must be unique within a registration.
    pub name: String,
    /// Confidence required to count a hit (range 0 - 1).
    pub threshold: f32,
    /// Consecutive hits required to fire.
    pub required_hits: usize,
    /// Min milliseconds between two fired detections of this keyword.
    pub min_interval_ms: u64,
    pub(crate) classifier: Box<dyn KeywordClassifier>,
}
impl KeywordModel {
    pub fn new(
        name: &str,
        classifier: Box<dyn KeywordClassifier>,
        threshold: f32,
        required_hits: usize,
    ) -> KeywordModel {
        KeywordModel {
            name: name.to_string(),
            threshold,
            required_hits,
            min_interval_ms: DETECTOR_DEFAULT_MIN_INTERVAL_MS,
            classifier,
        }
    }
    pub fn with_min_interval(mut self, min_interval_ms: u64) -> KeywordModel {
        self.min_interval_ms = min_interval_ms;
        self
    }
    pub fn get_input_frames(&self) -> usize {
        self.classifier.input_frames()
    }
    pub(crate) fn validate(&self, feature_queue_len: usize) -> Result<(), String> {
        if self.name.is_empty() {
            Err("Keyword name can not be empty".to_string())
        } else if !self.threshold.is_finite() || self.threshold < 0. || self.threshold > 1. {
            Err(format!(
                "Keyword \"{}\": threshold should be in range 0 - 1",
                self.name
            ))
        } else if self.required_hits == 0 {
            Err(format!(
                "Keyword \"{}\": required hits should be greater than zero",
                self.name
            ))
        } else if self.classifier.input_frames() == 0
            || self.classifier.input_frames() > feature_queue_len
        {
            Err(format!(
                "Keyword \"{}\": classifier input should be between 1 and {} embeddings",
                self.name, feature_queue_len
            ))
        } else {
            Ok(())
        }
    }
}

/// Result of feeding one score to a [`KeywordState`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum HitOutcome {
    /// Score at or under the fake threshold.
    Rejected,
    /// Score between the fake and the real threshold.
    Noise,
    /// Score over the threshold, holds the consecutive hit count.
    Armed(usize),
    Fired,
    /// Enough hits, but inside the debounce interval.
    Suppressed,
}

/// Hysteresis and debounce state of one keyword.
pub(crate) struct KeywordState {
    name: String,
    threshold: f32,
    fake_threshold: f32,
    required_hits: usize,
    min_interval_ms: u64,
    counter: usize,
    last_fire: Option<u64>,
}
impl KeywordState {
    pub fn new(model: &KeywordModel, fake_threshold_margin: f32) -> KeywordState {
        KeywordState {
            name: model.name.clone(),
            threshold: model.threshold,
            fake_threshold: (model.threshold - fake_threshold_margin).max(0.),
            required_hits: model.required_hits,
            min_interval_ms: model.min_interval_ms,
            counter: 0,
            last_fire: None,
        }
    }
    pub fn update(&mut self, score: f32, now_ms: u64) -> HitOutcome {
        let score = if score.is_finite() { score } else { 0. };
        let outcome = if score <= self.fake_threshold {
            self.counter = 0;
            HitOutcome::Rejected
        } else if score < self.threshold {
            self.counter = 0;
            HitOutcome::Noise
        } else {
            self.counter += 1;
            if self.counter < self.required_hits {
                HitOutcome::Armed(self.counter)
            } else {
                self.counter = 0;
                let elapsed_enough = self
                    .last_fire
                    .map_or(true, |last| now_ms.saturating_sub(last) >= self.min_interval_ms);
                if elapsed_enough {
                    self.last_fire = Some(now_ms);
                    HitOutcome::Fired
                } else {
                    HitOutcome::Suppressed
                }
            }
        };
        match outcome {
            HitOutcome::Armed(count) => debug!(
                "keyword '{}' hit {}/{}, score {}",
                self.name, count, self.required_hits, score
            ),
            HitOutcome::Suppressed => debug!(
                "keyword '{}' suppressed, less than {}ms since last detection",
                self.name, self.min_interval_ms
            ),
            _ => {}
        }
        outcome
    }
    pub fn get_name(&self) -> &str {
        &self.name
    }
    pub fn get_counter(&self) -> usize {
        self.counter
    }
    pub fn reset(&mut self) {
        self.counter = 0;
        self.last_fire = None;
    }
}

/// A registered keyword: its state machine and the classifier that feeds it.
pub(crate) struct Keyword {
    pub state: KeywordState,
    pub classifier: Box<dyn KeywordClassifier>,
}
impl Keyword {
    pub fn from_model(model: KeywordModel, fake_threshold_margin: f32) -> Keyword {
        Keyword {
            state: KeywordState::new(&model, fake_threshold_margin),
            classifier: model.classifier,
        }
    }
}

/// A fired keyword detection.
#[cfg_attr(feature = "debug", derive(Debug))]
#[derive(Clone)]
pub struct SpotterDetection {
    /// Detected keyword name.
    pub name: String,
    /// Score of the window that fired.
    pub score: f32,
    /// Hit counter of the keyword after firing, always zero.
    pub counter: usize,
    /// Clock milliseconds when the keyword fired.
    pub timestamp_ms: u64,
}
