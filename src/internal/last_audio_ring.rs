use std::io::{Cursor, Seek, Write};

use crate::constants::DETECTOR_INTERNAL_SAMPLE_RATE;

/// Circular buffer with the last seconds of audio, dumped as wav after each detection.
pub struct LastAudioRing {
    buffer: Vec<i16>,
    position: usize,
}
impl LastAudioRing {
    pub fn new(capacity: usize) -> LastAudioRing {
        LastAudioRing {
            buffer: vec![0; capacity],
            position: 0,
        }
    }
    pub fn store(&mut self, samples: &[i16]) {
        let capacity = self.buffer.len();
        if capacity == 0 {
            return;
        }
        let samples = if samples.len() > capacity {
            &samples[samples.len() - capacity..]
        } else {
            samples
        };
        let first_part = samples.len().min(capacity - self.position);
        self.buffer[self.position..self.position + first_part]
            .copy_from_slice(&samples[..first_part]);
        let second_part = samples.len() - first_part;
        self.buffer[..second_part].copy_from_slice(&samples[first_part..]);
        self.position = (self.position + samples.len()) % capacity;
    }
    /// Buffer content, oldest sample first.
    pub fn ordered(&self) -> Vec<i16> {
        let mut samples = Vec::with_capacity(self.buffer.len());
        samples.extend_from_slice(&self.buffer[self.position..]);
        samples.extend_from_slice(&self.buffer[..self.position]);
        samples
    }
    pub fn write_wav(&self, path: &str) -> Result<(), String> {
        let writer =
            hound::WavWriter::create(path, wav_spec()).map_err(|err| err.to_string())?;
        self.write_samples(writer)
    }
    pub fn wav_bytes(&self) -> Result<Vec<u8>, String> {
        let mut cursor = Cursor::new(Vec::new());
        let writer =
            hound::WavWriter::new(&mut cursor, wav_spec()).map_err(|err| err.to_string())?;
        self.write_samples(writer)?;
        Ok(cursor.into_inner())
    }
    pub fn clear(&mut self) {
        self.buffer.iter_mut().for_each(|sample| *sample = 0);
        self.position = 0;
    }
    fn write_samples<W: Write + Seek>(&self, mut writer: hound::WavWriter<W>) -> Result<(), String> {
        for sample in self.ordered() {
            writer
                .write_sample(sample)
                .map_err(|err| err.to_string())?;
        }
        writer.finalize().map_err(|err| err.to_string())
    }
}

fn wav_spec() -> hound::WavSpec {
    hound::WavSpec {
        sample_rate: DETECTOR_INTERNAL_SAMPLE_RATE as u32,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
        channels: 1,
    }
}
