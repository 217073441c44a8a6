use std::{
    collections::HashSet,
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use log::{debug, info, warn};

use crate::{
    constants::{
        DETECTOR_INTERNAL_SAMPLE_RATE, LAST_AUDIO_RECORD_SUFFIX, LAST_AUDIO_SECONDS,
        SPECTRAL_PREFILL_VALUE,
    },
    internal::{FeatureQueue, LastAudioRing, RawAudioRing, SpectralHistory},
    keyword::{HitOutcome, Keyword},
    scheduler::{IngestionScheduler, PushFrames},
    BulkConfig, Clock, EmbeddingModel, KeywordClassifier, KeywordModel, PipelineConfig,
    SpectralFrontend, SpectralWindow, SpotterConfig, SpotterDetection, SystemClock,
};

type DetectionCallback = Box<dyn FnMut(&SpotterDetection) + Send>;

/// Streaming keyword spotter.
///
/// Audio pushed while listening goes through the spectral frontend, the embedding model and
/// the keyword classifiers. Large pushes have their leading frames embedded in one batch, the
/// rest is classified frame by frame so results don't depend on how the audio is chunked.
///
/// ```ignore
/// let mut spotter = KeywordSpotter::new(&SpotterConfig::default(), frontend, embedding)?;
/// spotter.register_keywords(vec![KeywordModel::new("hey_test", classifier, 0.6, 3)])?;
/// spotter.start();
/// if spotter.push(&samples) {
///     println!("{:?}", spotter.last_detection().map(|detection| &detection.name));
/// }
/// ```
pub struct KeywordSpotter {
    // config
    pipeline: PipelineConfig,
    fake_threshold_margin: f32,
    warmup: bool,
    record_path: Option<String>,
    // collaborators
    frontend: Box<dyn SpectralFrontend>,
    embedding: Box<dyn EmbeddingModel>,
    keywords: Vec<Keyword>,
    clock: Box<dyn Clock>,
    detection_callback: Option<DetectionCallback>,
    // state
    raw_audio: Arc<Mutex<RawAudioRing>>,
    spectral_history: SpectralHistory,
    feature_queue: FeatureQueue,
    last_audio: LastAudioRing,
    scheduler: IngestionScheduler,
    pending_windows: Vec<SpectralWindow>,
    listening: Arc<AtomicBool>,
    last_detection: Option<SpotterDetection>,
    last_record_path: Option<String>,
}
impl KeywordSpotter {
    pub fn new(
        config: &SpotterConfig,
        frontend: Box<dyn SpectralFrontend>,
        embedding: Box<dyn EmbeddingModel>,
    ) -> Result<KeywordSpotter, String> {
        config.pipeline.validate()?;
        config.detector.validate()?;
        if frontend.feature_size() == 0 {
            return Err("Spectral frontend feature size should be greater than zero".to_string());
        }
        if embedding.embedding_size() == 0 {
            return Err("Embedding size should be greater than zero".to_string());
        }
        let pipeline = config.pipeline.clone();
        let mut spotter = KeywordSpotter {
            fake_threshold_margin: config.detector.fake_threshold_margin,
            warmup: config.detector.warmup,
            record_path: config.detector.record_path.clone(),
            raw_audio: Arc::new(Mutex::new(RawAudioRing::new(
                pipeline.raw_buffer_len,
                pipeline.min_lookback,
            ))),
            spectral_history: SpectralHistory::new(
                pipeline.spectral_history_len,
                frontend.feature_size(),
            ),
            feature_queue: FeatureQueue::new(
                pipeline.feature_queue_len,
                embedding.embedding_size(),
            ),
            last_audio: LastAudioRing::new(DETECTOR_INTERNAL_SAMPLE_RATE * LAST_AUDIO_SECONDS),
            scheduler: IngestionScheduler::new(pipeline.frame_length, config.bulk),
            pending_windows: Vec::new(),
            frontend,
            embedding,
            keywords: Vec::new(),
            clock: Box::new(SystemClock),
            detection_callback: None,
            listening: Arc::new(AtomicBool::new(false)),
            last_detection: None,
            last_record_path: None,
            pipeline,
        };
        spotter.reset_state();
        Ok(spotter)
    }
    /// Replaces every registered keyword, counters and debounce timers start fresh.
    ///
    /// All models are validated first, on error the previous keywords stay active.
    pub fn register_keywords(&mut self, models: Vec<KeywordModel>) -> Result<(), String> {
        if models.is_empty() {
            return Err("At least one keyword is required".to_string());
        }
        let mut names = HashSet::new();
        for model in models.iter() {
            model.validate(self.pipeline.feature_queue_len)?;
            if !names.insert(model.name.as_str()) {
                return Err(format!("Keyword \"{}\" is duplicated", model.name));
            }
        }
        self.keywords = models
            .into_iter()
            .map(|model| Keyword::from_model(model, self.fake_threshold_margin))
            .collect();
        info!("Keywords registered: {:?}", self.keyword_names());
        Ok(())
    }
    /// Replaces every registered keyword by a single one, with the default detection interval.
    pub fn replace_keyword(
        &mut self,
        name: &str,
        classifier: Box<dyn KeywordClassifier>,
        threshold: f32,
        required_hits: usize,
    ) -> Result<(), String> {
        self.register_keywords(vec![KeywordModel::new(
            name,
            classifier,
            threshold,
            required_hits,
        )])
    }
    pub fn configure_bulk(&mut self, enabled: bool, ratio: f32, min_samples: usize) {
        self.scheduler.configure(BulkConfig {
            enabled,
            ratio,
            min_samples,
        });
        let bulk = self.scheduler.get_bulk_config();
        debug!(
            "bulk ingestion enabled: {}, ratio: {}, min samples: {}",
            bulk.enabled, bulk.ratio, bulk.min_samples
        );
    }
    pub fn get_bulk_config(&self) -> BulkConfig {
        self.scheduler.get_bulk_config()
    }
    pub fn set_detection_callback<F>(&mut self, callback: F)
    where
        F: FnMut(&SpotterDetection) + Send + 'static,
    {
        self.detection_callback = Some(Box::new(callback));
    }
    pub fn set_clock<C: Clock + 'static>(&mut self, clock: C) {
        self.clock = Box::new(clock);
    }
    /// Resets the pipeline, warms the models up and starts accepting audio.
    pub fn start(&mut self) {
        if self.is_listening() {
            return;
        }
        self.reset_state();
        if self.warmup {
            self.warmup_models();
        }
        self.listening.store(true, Ordering::SeqCst);
        info!("Listening");
    }
    /// Stops accepting audio. Windows waiting for their embeddings are flushed and the
    /// carried partial frame is dropped.
    pub fn stop(&mut self) {
        let was_listening = self.listening.swap(false, Ordering::SeqCst);
        if let Err(err) = self.flush_pending_windows() {
            warn!("Unable to flush pending windows: {}", err);
        }
        self.scheduler.clear_carry();
        if was_listening {
            info!("Stopped listening");
        }
    }
    /// Clears every buffer and keyword state. Listening state is kept.
    pub fn reset(&mut self) {
        self.reset_state();
        debug!("reset");
    }
    /// Stops and releases the models.
    pub fn close(mut self) {
        self.stop();
        info!("Closed");
    }
    /// Feeds a chunk of any length.
    ///
    /// Returns true when a keyword was detected, in that case the rest of the chunk is
    /// discarded.
    pub fn push(&mut self, samples: &[i16]) -> bool {
        if !self.is_listening() || samples.is_empty() {
            return false;
        }
        match self.ingest(samples) {
            Ok(detected) => detected,
            Err(err) => {
                warn!("Unable to process audio, stopping: {}", err);
                self.stop();
                false
            }
        }
    }
    /// Feeds exactly one frame, bypassing the bulk ingestion and the carry.
    pub fn process_frame(&mut self, frame: &[i16]) -> bool {
        if !self.is_listening() {
            return false;
        }
        if frame.len() != self.pipeline.frame_length {
            warn!(
                "Ignoring frame of {} samples, expected {}",
                frame.len(),
                self.pipeline.frame_length
            );
            return false;
        }
        match self.process_tail_frame(frame) {
            Ok(detected) => detected,
            Err(err) => {
                warn!("Unable to process frame, stopping: {}", err);
                self.stop();
                false
            }
        }
    }
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            listening: self.listening.clone(),
        }
    }
    pub fn audio_tap(&self) -> AudioTap {
        AudioTap {
            raw_audio: self.raw_audio.clone(),
        }
    }
    /// Copy of the embedding history, oldest first.
    pub fn features(&self) -> Vec<Vec<f32>> {
        self.feature_queue.to_vec()
    }
    pub fn keyword_counter(&self, name: &str) -> Option<usize> {
        self.keywords
            .iter()
            .find(|keyword| keyword.state.get_name() == name)
            .map(|keyword| keyword.state.get_counter())
    }
    pub fn keyword_names(&self) -> Vec<String> {
        self.keywords
            .iter()
            .map(|keyword| keyword.state.get_name().to_string())
            .collect()
    }
    pub fn carry_len(&self) -> usize {
        self.scheduler.get_carry_len()
    }
    pub fn spectral_history_len(&self) -> usize {
        self.spectral_history.len()
    }
    pub fn last_detection(&self) -> Option<&SpotterDetection> {
        self.last_detection.as_ref()
    }
    /// Path of the last audio dump written on detection.
    pub fn last_record_path(&self) -> Option<&str> {
        self.last_record_path.as_deref()
    }
    /// Last seconds of ingested audio as wav bytes.
    pub fn last_audio_wav(&self) -> Result<Vec<u8>, String> {
        self.last_audio.wav_bytes()
    }
    pub fn get_samples_per_frame(&self) -> usize {
        self.pipeline.frame_length
    }
    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }
    fn ingest(&mut self, samples: &[i16]) -> Result<bool, String> {
        let frames = match self.scheduler.split(samples) {
            Some(frames) => frames,
            None => return Ok(false),
        };
        let plan = frames.get_plan();
        if plan.head_frames > 0 {
            debug!(
                "bulk ingestion, {} head frames, {} tail frames",
                plan.head_frames, plan.tail_frames
            );
        }
        for index in 0..plan.head_frames {
            if !self.is_listening() {
                return self.abort_push();
            }
            if self.run_frame(&frames, index, true)? {
                self.scheduler.clear_carry();
                return Ok(true);
            }
        }
        self.flush_pending_windows()?;
        for index in plan.head_frames..frames.len() {
            if !self.is_listening() {
                return self.abort_push();
            }
            if self.run_frame(&frames, index, false)? {
                self.scheduler.clear_carry();
                return Ok(true);
            }
        }
        self.scheduler.store_carry(frames.remainder());
        Ok(false)
    }
    fn abort_push(&mut self) -> Result<bool, String> {
        debug!("stopped while ingesting, discarding the rest of the push");
        self.scheduler.clear_carry();
        self.flush_pending_windows()?;
        Ok(false)
    }
    fn run_frame(&mut self, frames: &PushFrames, index: usize, head: bool) -> Result<bool, String> {
        let frame = frames.frame(index);
        let result = if head {
            self.ingest_frame(frame).map(|window| {
                if let Some(window) = window {
                    self.pending_windows.push(window);
                }
                false
            })
        } else {
            self.process_tail_frame(frame)
        };
        match result {
            Err(err) if index == 0 && !frames.carried().is_empty() => {
                warn!(
                    "Unable to process carried-over frame, processing carried samples alone: {}",
                    err
                );
                self.recover_raw_audio();
                self.process_tail_frame(frames.carried())
            }
            result => result,
        }
    }
    fn process_tail_frame(&mut self, frame: &[i16]) -> Result<bool, String> {
        let window = match self.ingest_frame(frame)? {
            Some(window) => window,
            None => return Ok(false),
        };
        if self.embed_windows(vec![window])? == 0 {
            return Ok(false);
        }
        match self.run_classifiers() {
            Some(detection) => {
                self.on_detection(detection);
                Ok(true)
            }
            None => Ok(false),
        }
    }
    /// Buffers the frame and returns the latest spectral window if the frame added rows.
    fn ingest_frame(&mut self, frame: &[i16]) -> Result<Option<SpectralWindow>, String> {
        let snapshot = {
            let mut raw_audio = self
                .raw_audio
                .lock()
                .map_err(|_| "Raw audio buffer is poisoned".to_string())?;
            raw_audio.push(frame);
            raw_audio.snapshot(frame.len() + self.pipeline.spectral_context)
        };
        self.last_audio.store(frame);
        let samples = match snapshot {
            Some(samples) => samples,
            None => return Ok(None),
        };
        let rows = match self.frontend.compute(&samples) {
            Ok(rows) => rows,
            Err(err) => {
                warn!("Spectral frontend failed: {}", err);
                return Ok(None);
            }
        };
        if rows.is_empty() {
            return Ok(None);
        }
        if rows
            .iter()
            .any(|row| row.len() != self.spectral_history.width())
        {
            warn!(
                "Spectral frontend returned rows of unexpected size, expected {}",
                self.spectral_history.width()
            );
            return Ok(None);
        }
        let scale = self.pipeline.spectral_scale;
        let offset = self.pipeline.spectral_offset;
        self.spectral_history.append(
            rows.into_iter()
                .map(|row| row.into_iter().map(|value| value * scale + offset).collect())
                .collect(),
        )?;
        Ok(self
            .spectral_history
            .latest_window(self.pipeline.window_frames))
    }
    fn flush_pending_windows(&mut self) -> Result<(), String> {
        let windows = std::mem::take(&mut self.pending_windows);
        self.embed_windows(windows).map(|_| ())
    }
    /// Embeds the windows and pushes the results in order, returns the number pushed.
    fn embed_windows(&mut self, windows: Vec<SpectralWindow>) -> Result<usize, String> {
        if windows.is_empty() {
            return Ok(0);
        }
        let embeddings = match self.embedding.embed(&windows) {
            Ok(embeddings) => embeddings,
            Err(err) => {
                warn!("Embedding model failed: {}", err);
                return Ok(0);
            }
        };
        let embedding_size = self.feature_queue.dim();
        if embeddings.len() != windows.len()
            || embeddings
                .iter()
                .any(|embedding| embedding.len() != embedding_size)
        {
            warn!(
                "Embedding model returned {} vectors for {} windows, dropping them",
                embeddings.len(),
                windows.len()
            );
            return Ok(0);
        }
        let pushed = embeddings.len();
        for embedding in embeddings {
            self.feature_queue.push(embedding)?;
        }
        Ok(pushed)
    }
    fn run_classifiers(&mut self) -> Option<SpotterDetection> {
        let now = self.clock.now_ms();
        for keyword in self.keywords.iter_mut() {
            let features = match self
                .feature_queue
                .latest(keyword.classifier.input_frames())
            {
                Some(features) => features,
                None => continue,
            };
            let score = match keyword.classifier.classify(&features) {
                Ok(score) => score,
                Err(err) => {
                    warn!(
                        "Classifier of keyword '{}' failed: {}",
                        keyword.state.get_name(),
                        err
                    );
                    0.
                }
            };
            if keyword.state.update(score, now) == HitOutcome::Fired {
                return Some(SpotterDetection {
                    name: keyword.state.get_name().to_string(),
                    score,
                    counter: keyword.state.get_counter(),
                    timestamp_ms: now,
                });
            }
        }
        None
    }
    fn on_detection(&mut self, detection: SpotterDetection) {
        info!(
            "keyword '{}' detected, score {}",
            detection.name, detection.score
        );
        if let Some(record_path) = self.record_path.as_ref() {
            let path = Path::new(record_path)
                .join(format!("{}{}", detection.name, LAST_AUDIO_RECORD_SUFFIX))
                .to_string_lossy()
                .to_string();
            match self.last_audio.write_wav(&path) {
                Ok(()) => self.last_record_path = Some(path),
                Err(err) => warn!("Unable to write detection audio to {}: {}", path, err),
            }
        }
        if let Some(callback) = self.detection_callback.as_mut() {
            callback(&detection);
        }
        self.last_detection = Some(detection);
    }
    /// Empties the raw ring and clears its poison flag.
    fn recover_raw_audio(&mut self) {
        match self.raw_audio.lock() {
            Ok(mut raw_audio) => raw_audio.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
        self.raw_audio.clear_poison();
    }
    fn reset_state(&mut self) {
        self.recover_raw_audio();
        self.spectral_history.clear();
        self.feature_queue.clear();
        self.last_audio.clear();
        self.pending_windows.clear();
        self.scheduler.clear_carry();
        self.keywords
            .iter_mut()
            .for_each(|keyword| keyword.state.reset());
        if self.pipeline.prefill {
            self.spectral_history
                .prefill(self.pipeline.window_frames, SPECTRAL_PREFILL_VALUE);
            self.feature_queue.prefill();
        }
    }
    fn warmup_models(&mut self) {
        let silence = vec![0; self.pipeline.frame_length + self.pipeline.spectral_context];
        if let Err(err) = self.frontend.compute(&silence) {
            warn!("Spectral frontend warmup failed: {}", err);
        }
        let window = self
            .spectral_history
            .latest_window(self.pipeline.window_frames)
            .unwrap_or_else(|| {
                vec![
                    vec![SPECTRAL_PREFILL_VALUE; self.spectral_history.width()];
                    self.pipeline.window_frames
                ]
            });
        if let Err(err) = self.embedding.embed(&[window]) {
            warn!("Embedding model warmup failed: {}", err);
        }
        let embedding_size = self.feature_queue.dim();
        for keyword in self.keywords.iter_mut() {
            let zeros = vec![vec![0f32; embedding_size]; keyword.classifier.input_frames()];
            let features = zeros.iter().map(|vector| &vector[..]).collect::<Vec<_>>();
            if let Err(err) = keyword.classifier.classify(&features) {
                warn!(
                    "Classifier of keyword '{}' warmup failed: {}",
                    keyword.state.get_name(),
                    err
                );
            }
        }
        debug!("models warmed up");
    }
}

/// Stops a [`KeywordSpotter`] from any thread, ingestion ends at the next frame boundary.
#[derive(Clone)]
pub struct StopHandle {
    listening: Arc<AtomicBool>,
}
impl StopHandle {
    pub fn stop(&self) {
        self.listening.store(false, Ordering::SeqCst);
    }
    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }
}

/// Read access to the raw audio ring of a [`KeywordSpotter`] from any thread.
#[derive(Clone)]
pub struct AudioTap {
    raw_audio: Arc<Mutex<RawAudioRing>>,
}
impl AudioTap {
    /// Last `n` buffered samples, `None` while there is not enough audio buffered.
    pub fn snapshot(&self, n: usize) -> Option<Vec<i16>> {
        self.raw_audio
            .lock()
            .ok()
            .and_then(|raw_audio| raw_audio.snapshot(n))
    }
    pub fn len(&self) -> usize {
        self.raw_audio
            .lock()
            .map(|raw_audio| raw_audio.len())
            .unwrap_or(0)
    }
}
