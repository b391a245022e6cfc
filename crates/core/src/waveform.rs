//! Pre-computed waveform peak data and resampling.
//!
//! Peaks arrive already analysed (audiowaveform-style JSON or computed from raw
//! samples by the host); this module only regroups them for display.

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::error::{PeaklineError, Result};

/// Pre-computed waveform data for efficient rendering.
///
/// Stores (min_peak, max_peak) pairs, each covering `samples_per_pixel` source
/// sample frames. Amplitudes are normalized to [-1.0, 1.0].
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformData {
    /// (min_peak, max_peak) pairs per bucket.
    pub peaks: Vec<(f32, f32)>,
    /// How many source sample frames each bucket represents.
    pub samples_per_pixel: u32,
    /// Sample rate of the analysed audio.
    pub sample_rate: u32,
}

pub const DEFAULT_SAMPLES_PER_PIXEL: u32 = 256;

/// On-disk layout written by audiowaveform's `--output-format json`.
#[derive(Debug, Deserialize)]
struct AudiowaveformJson {
    #[serde(default = "default_channels")]
    channels: u32,
    sample_rate: u32,
    samples_per_pixel: u32,
    bits: u32,
    length: usize,
    data: Vec<i32>,
}

fn default_channels() -> u32 {
    1
}

impl WaveformData {
    /// Compute waveform peaks from mono audio samples.
    pub fn from_samples(samples: &[f32], sample_rate: u32, samples_per_pixel: u32) -> Self {
        let bucket = samples_per_pixel.max(1) as usize;
        let mut peaks = Vec::with_capacity(samples.len() / bucket + 1);
        for chunk in samples.chunks(bucket) {
            let mut min = f32::INFINITY;
            let mut max = f32::NEG_INFINITY;
            for &s in chunk {
                if s < min { min = s; }
                if s > max { max = s; }
            }
            peaks.push((min, max));
        }

        Self {
            peaks,
            samples_per_pixel: bucket as u32,
            sample_rate,
        }
    }

    /// Parse audiowaveform JSON. Multi-channel data is merged into one envelope.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: AudiowaveformJson = serde_json::from_str(json)
            .map_err(|e| PeaklineError::InvalidWaveform(e.to_string()))?;

        if raw.sample_rate == 0 {
            return Err(PeaklineError::InvalidWaveform("sample_rate is 0".into()));
        }
        if raw.samples_per_pixel == 0 {
            return Err(PeaklineError::InvalidWaveform("samples_per_pixel is 0".into()));
        }
        if raw.bits != 8 && raw.bits != 16 {
            return Err(PeaklineError::InvalidWaveform(format!(
                "unsupported bit depth {}",
                raw.bits
            )));
        }
        let channels = raw.channels.max(1) as usize;
        let stride = channels * 2;
        if raw.data.len() < raw.length * stride {
            return Err(PeaklineError::InvalidWaveform(format!(
                "expected {} values for {} buckets, found {}",
                raw.length * stride,
                raw.length,
                raw.data.len()
            )));
        }

        let full_scale = (1i32 << (raw.bits - 1)) as f32;
        let peaks = raw.data[..raw.length * stride]
            .chunks(stride)
            .map(|bucket| {
                let mut min = f32::INFINITY;
                let mut max = f32::NEG_INFINITY;
                for pair in bucket.chunks(2) {
                    min = min.min(pair[0] as f32 / full_scale);
                    max = max.max(pair[1] as f32 / full_scale);
                }
                (min, max)
            })
            .collect();

        Ok(Self {
            peaks,
            samples_per_pixel: raw.samples_per_pixel,
            sample_rate: raw.sample_rate,
        })
    }

    /// Load audiowaveform JSON from disk.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read waveform file: {}", path.display()))?;
        let data = Self::from_json_str(&json)
            .with_context(|| format!("Failed to parse waveform file: {}", path.display()))?;
        log::debug!(
            "Loaded {}: {} buckets at {} samples/pixel, {:.2}s",
            path.display(),
            data.peaks.len(),
            data.samples_per_pixel,
            data.duration_s()
        );
        Ok(data)
    }

    /// Number of source sample frames covered by the peak data.
    pub fn total_frames(&self) -> u64 {
        self.peaks.len() as u64 * self.samples_per_pixel as u64
    }

    /// Duration in seconds.
    pub fn duration_s(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.total_frames() as f64 / self.sample_rate as f64
    }

    /// Regroup peaks at a coarser integer scale.
    ///
    /// Fails when `scale` is finer than the stored resolution: peaks cannot be
    /// split back into samples.
    pub fn resample(&self, scale: u32) -> Result<WaveformData> {
        if scale == 0 {
            return Err(PeaklineError::InvalidScale(0.0));
        }
        if scale < self.samples_per_pixel {
            return Err(PeaklineError::ZoomBelowResolution {
                requested: scale,
                minimum: self.samples_per_pixel,
            });
        }
        if scale == self.samples_per_pixel {
            return Ok(self.clone());
        }

        let width = self.total_frames().div_ceil(scale as u64) as usize;
        let peaks = self.columns(0.0, scale as f64, width);
        log::debug!(
            "Resampled {} buckets at {} -> {} buckets at {}",
            self.peaks.len(),
            self.samples_per_pixel,
            peaks.len(),
            scale
        );
        Ok(WaveformData {
            peaks,
            samples_per_pixel: scale,
            sample_rate: self.sample_rate,
        })
    }

    /// Peak envelope for `width` pixel columns starting at `frame_offset`, at an
    /// arbitrary (possibly fractional) scale.
    ///
    /// Stops early at the end of the data, so the result may be shorter than `width`.
    pub fn columns(&self, frame_offset: f64, scale: f64, width: usize) -> Vec<(f32, f32)> {
        let total = self.total_frames() as f64;
        let spp = self.samples_per_pixel as f64;
        let mut out = Vec::with_capacity(width);
        if self.peaks.is_empty() || scale.is_nan() || scale <= 0.0 {
            return out;
        }

        for col in 0..width {
            let start = frame_offset.max(0.0) + col as f64 * scale;
            if start >= total {
                break;
            }
            let end = (start + scale).min(total);
            let first = (start / spp).floor() as usize;
            let last = ((end / spp).ceil() as usize).clamp(first + 1, self.peaks.len());
            out.push(merge_peaks(&self.peaks[first..last]));
        }
        out
    }
}

/// Composite min/max over a run of buckets.
fn merge_peaks(buckets: &[(f32, f32)]) -> (f32, f32) {
    buckets.iter().fold(
        (f32::INFINITY, f32::NEG_INFINITY),
        |(lo, hi), &(min, max)| (lo.min(min), hi.max(max)),
    )
}
