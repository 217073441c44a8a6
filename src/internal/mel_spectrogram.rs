use std::{f32::consts::PI, sync::Arc};

use rustfft::{num_complex::Complex32, Fft, FftPlanner};

use crate::{
    constants::{
        DETECTOR_INTERNAL_SAMPLE_RATE, MEL_BINS, MEL_FFT_LENGTH, MEL_HOP_LENGTH, MEL_MIN_POWER,
    },
    SpectralFrontend,
};

/// Log-mel spectrogram computed on cpu.
///
/// Emits one row of `num_bins` decibel values every `hop_length` samples, each row covering
/// `fft_length` samples. Spans shorter than `fft_length` produce no rows.
pub struct MelSpectrogram {
    fft: Arc<dyn Fft<f32>>,
    fft_length: usize,
    hop_length: usize,
    num_bins: usize,
    filter_bank: Vec<Vec<f32>>,
    hamming_window: Vec<f32>,
}
impl MelSpectrogram {
    pub fn new(
        sample_rate: usize,
        fft_length: usize,
        hop_length: usize,
        num_bins: usize,
    ) -> MelSpectrogram {
        let fft_length = fft_length.max(2);
        let power_spectrum_size = fft_length / 2 + 1;
        MelSpectrogram {
            fft: FftPlanner::new().plan_fft_forward(fft_length),
            fft_length,
            hop_length: hop_length.max(1),
            num_bins,
            filter_bank: Self::new_mel_filter_bank(
                sample_rate,
                fft_length,
                power_spectrum_size,
                num_bins,
            ),
            hamming_window: Self::new_hamming_window(fft_length),
        }
    }
    fn compute_rows(&self, samples: &[i16]) -> Vec<Vec<f32>> {
        if samples.len() < self.fft_length {
            return Vec::new();
        }
        let signal = samples
            .iter()
            .map(|sample| *sample as f32 / 32768.)
            .collect::<Vec<f32>>();
        (0..=signal.len() - self.fft_length)
            .step_by(self.hop_length)
            .map(|start| {
                let power_spectrum =
                    self.calculate_power_spectrum(&signal[start..start + self.fft_length]);
                self.calculate_log_mel_spectrum(&power_spectrum)
            })
            .collect()
    }
    fn calculate_power_spectrum(&self, audio_frame: &[f32]) -> Vec<f32> {
        let mut buffer = audio_frame
            .iter()
            .zip(self.hamming_window.iter())
            .map(|(sample, weight)| Complex32 {
                re: sample * weight,
                im: 0.,
            })
            .collect::<Vec<_>>();
        self.fft.process(&mut buffer);
        buffer[..self.fft_length / 2 + 1]
            .iter()
            .map(|bin| bin.re * bin.re + bin.im * bin.im)
            .collect()
    }
    fn calculate_log_mel_spectrum(&self, power_spectrum: &[f32]) -> Vec<f32> {
        self.filter_bank
            .iter()
            .map(|filter| {
                let energy: f32 = filter
                    .iter()
                    .zip(power_spectrum.iter())
                    .map(|(weight, power)| weight * power)
                    .sum();
                10. * energy.max(MEL_MIN_POWER).log10()
            })
            .collect()
    }
    fn new_hamming_window(samples_per_frame: usize) -> Vec<f32> {
        let ns_minus_1 = samples_per_frame - 1;
        (0..samples_per_frame)
            .map(|s| 0.54 - (0.46 * (2. * PI * (s as f32 / ns_minus_1 as f32)).cos()))
            .collect()
    }
    fn frequency_to_mel(frequency: f32) -> f32 {
        2595. * (1. + frequency / 700.).log10()
    }
    fn mel_to_frequency(mel: f32) -> f32 {
        700. * (10_f32.powf(mel / 2595.) - 1.)
    }
    fn new_mel_filter_bank(
        sample_rate: usize,
        fft_length: usize,
        power_spectrum_size: usize,
        num_bins: usize,
    ) -> Vec<Vec<f32>> {
        let max_mel = Self::frequency_to_mel(sample_rate as f32 / 2.);
        let mut filter_bank = vec![vec![0.; power_spectrum_size]; num_bins];
        let centre_indices: Vec<usize> = (0..num_bins + 2)
            .map(|i| {
                let frequency = Self::mel_to_frequency(i as f32 * max_mel / (num_bins + 1) as f32);
                (((fft_length + 1) as f32 * frequency / sample_rate as f32).floor() as usize)
                    .min(power_spectrum_size - 1)
            })
            .collect();
        for (i, filter) in filter_bank.iter_mut().enumerate() {
            let filter_begin_index = centre_indices[i];
            let filter_center_index = centre_indices[i + 1];
            let filter_end_index = centre_indices[i + 2];
            // upward slope
            for k in filter_begin_index..filter_center_index {
                filter[k] = (k - filter_begin_index) as f32
                    / (filter_center_index - filter_begin_index) as f32;
            }
            // downwards slope
            for k in filter_center_index..filter_end_index {
                filter[k] =
                    (filter_end_index - k) as f32 / (filter_end_index - filter_center_index) as f32;
            }
            // collapsed filters still pick up their own bin
            if filter_begin_index == filter_end_index {
                filter[filter_center_index] = 1.;
            }
        }
        filter_bank
    }
}
impl Default for MelSpectrogram {
    fn default() -> MelSpectrogram {
        MelSpectrogram::new(
            DETECTOR_INTERNAL_SAMPLE_RATE,
            MEL_FFT_LENGTH,
            MEL_HOP_LENGTH,
            MEL_BINS,
        )
    }
}
impl SpectralFrontend for MelSpectrogram {
    fn feature_size(&self) -> usize {
        self.num_bins
    }
    fn compute(&mut self, samples: &[i16]) -> Result<Vec<Vec<f32>>, String> {
        Ok(self.compute_rows(samples))
    }
}
