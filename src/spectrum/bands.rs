//! Named frequency bands and their mapping to band-vector indices
//!
//! Band boundaries are defined in Hz and mapped once per session into
//! index space over the aggregated band-energy vector. The mapping is
//! derived from the Nyquist frequency, so it must be recomputed whenever
//! the source sample rate (or the band count) changes, never per frame.

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Named frequency band
///
/// The percussive channels read the first six regions; the vocal detector
/// additionally reads the formant/harmonic/sibilance/presence regions,
/// which deliberately overlap the musical ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BandLabel {
    /// 20-60 Hz: kick drum fundamentals
    SubBass,
    /// 60-250 Hz: bass instruments
    Bass,
    /// 250-500 Hz: low mids
    LowMid,
    /// 500-2000 Hz: snare body, melodic content
    Mid,
    /// 2000-4000 Hz: claps, attack transients
    HighMid,
    /// 4000-8000 Hz: hi-hats, cymbals
    High,
    /// 300-1000 Hz: vocal formants
    Formant,
    /// 1000-3000 Hz: vocal harmonics
    Harmonic,
    /// 4000-8000 Hz: vocal sibilance
    Sibilance,
    /// 8000-12000 Hz: vocal presence/air
    Presence,
}

impl BandLabel {
    /// All defined band labels, in ascending order of lower edge
    pub const ALL: [BandLabel; 10] = [
        BandLabel::SubBass,
        BandLabel::Bass,
        BandLabel::LowMid,
        BandLabel::Formant,
        BandLabel::Mid,
        BandLabel::Harmonic,
        BandLabel::HighMid,
        BandLabel::High,
        BandLabel::Sibilance,
        BandLabel::Presence,
    ];

    /// Frequency range covered by this band, in Hz (inclusive)
    pub fn hz_range(&self) -> (f32, f32) {
        match self {
            BandLabel::SubBass => (20.0, 60.0),
            BandLabel::Bass => (60.0, 250.0),
            BandLabel::LowMid => (250.0, 500.0),
            BandLabel::Mid => (500.0, 2000.0),
            BandLabel::HighMid => (2000.0, 4000.0),
            BandLabel::High => (4000.0, 8000.0),
            BandLabel::Formant => (300.0, 1000.0),
            BandLabel::Harmonic => (1000.0, 3000.0),
            BandLabel::Sibilance => (4000.0, 8000.0),
            BandLabel::Presence => (8000.0, 12000.0),
        }
    }

    /// Band name as a display string
    pub fn as_str(&self) -> &'static str {
        match self {
            BandLabel::SubBass => "SubBass",
            BandLabel::Bass => "Bass",
            BandLabel::LowMid => "LowMid",
            BandLabel::Mid => "Mid",
            BandLabel::HighMid => "HighMid",
            BandLabel::High => "High",
            BandLabel::Formant => "Formant",
            BandLabel::Harmonic => "Harmonic",
            BandLabel::Sibilance => "Sibilance",
            BandLabel::Presence => "Presence",
        }
    }
}

/// Inclusive index range into the band-energy vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandRange {
    /// First index (inclusive)
    pub lo: usize,
    /// Last index (inclusive)
    pub hi: usize,
}

/// Mapping from named bands to index ranges over the band-energy vector
///
/// Built once per session from the sample rate and band count. Ranges are
/// clamped to `[0, band_count - 1]` and always satisfy `lo <= hi`.
#[derive(Debug, Clone)]
pub struct BandMap {
    sample_rate: u32,
    band_count: usize,
    ranges: Vec<(BandLabel, BandRange)>,
}

impl BandMap {
    /// Build a band map for the given sample rate and band count
    ///
    /// Each of the `band_count` entries in the energy vector covers
    /// `(sample_rate / 2) / band_count` Hz; Hz edges are mapped through
    /// that width and clamped into valid index space.
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` if `sample_rate` or
    /// `band_count` is zero.
    pub fn new(sample_rate: u32, band_count: usize) -> Result<Self, AnalysisError> {
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidInput(
                "Sample rate must be > 0".to_string(),
            ));
        }
        if band_count == 0 {
            return Err(AnalysisError::InvalidInput(
                "Band count must be > 0".to_string(),
            ));
        }

        let band_width_hz = (sample_rate as f32 / 2.0) / band_count as f32;
        let max_index = band_count - 1;

        let ranges = BandLabel::ALL
            .iter()
            .map(|&label| {
                let (lo_hz, hi_hz) = label.hz_range();
                let lo = ((lo_hz / band_width_hz) as usize).min(max_index);
                let hi = ((hi_hz / band_width_hz) as usize).min(max_index).max(lo);
                (label, BandRange { lo, hi })
            })
            .collect();

        log::debug!(
            "Band map built: {} bands, {:.1} Hz per band at {} Hz sample rate",
            band_count,
            band_width_hz,
            sample_rate
        );

        Ok(Self {
            sample_rate,
            band_count,
            ranges,
        })
    }

    /// Whether this map is stale for the given source parameters
    pub fn needs_rebuild(&self, sample_rate: u32, band_count: usize) -> bool {
        self.sample_rate != sample_rate || self.band_count != band_count
    }

    /// Index range for a named band
    pub fn range(&self, label: BandLabel) -> BandRange {
        self.ranges
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, r)| *r)
            .unwrap_or(BandRange { lo: 0, hi: 0 })
    }

    /// Slice of an energy vector covered by a named band
    ///
    /// Returns an empty slice if the vector is shorter than the range.
    pub fn slice<'a>(&self, energies: &'a [f32], label: BandLabel) -> &'a [f32] {
        let r = self.range(label);
        if r.lo >= energies.len() {
            return &[];
        }
        &energies[r.lo..=r.hi.min(energies.len() - 1)]
    }

    /// Mean energy of a named band, 0.0 for an empty slice
    pub fn mean(&self, energies: &[f32], label: BandLabel) -> f32 {
        let slice = self.slice(energies, label);
        if slice.is_empty() {
            return 0.0;
        }
        slice.iter().sum::<f32>() / slice.len() as f32
    }

    /// Number of entries in the band-energy vector this map indexes
    pub fn band_count(&self) -> usize {
        self.band_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_map_ranges_within_bounds() {
        let map = BandMap::new(44100, 64).unwrap();

        for &label in BandLabel::ALL.iter() {
            let r = map.range(label);
            assert!(r.lo <= r.hi, "{}: lo must not exceed hi", label.as_str());
            assert!(r.hi < 64, "{}: hi must be within band count", label.as_str());
        }
    }

    #[test]
    fn test_band_map_monotonic_in_frequency() {
        let map = BandMap::new(44100, 64).unwrap();

        // Lower edges follow the Hz ordering of the labels
        let mut prev_lo = 0;
        for &label in BandLabel::ALL.iter() {
            let r = map.range(label);
            assert!(
                r.lo >= prev_lo,
                "{}: lower edges should be monotonic, got {} after {}",
                label.as_str(),
                r.lo,
                prev_lo
            );
            prev_lo = r.lo;
        }
    }

    #[test]
    fn test_band_map_sample_rate_awareness() {
        let map_44k = BandMap::new(44100, 64).unwrap();
        let map_96k = BandMap::new(96000, 64).unwrap();

        // At a higher sample rate each index covers more Hz, so the same
        // Hz band lands on lower (or equal) indices.
        let high_44k = map_44k.range(BandLabel::High);
        let high_96k = map_96k.range(BandLabel::High);
        assert!(high_96k.lo <= high_44k.lo);
        assert!(high_96k.hi <= high_44k.hi);

        assert!(map_44k.needs_rebuild(96000, 64));
        assert!(map_44k.needs_rebuild(44100, 32));
        assert!(!map_44k.needs_rebuild(44100, 64));
    }

    #[test]
    fn test_band_map_invalid_inputs() {
        assert!(BandMap::new(0, 64).is_err());
        assert!(BandMap::new(44100, 0).is_err());
    }

    #[test]
    fn test_band_mean_and_slice() {
        let map = BandMap::new(44100, 64).unwrap();
        let mut energies = vec![0.0f32; 64];

        let r = map.range(BandLabel::Mid);
        for i in r.lo..=r.hi {
            energies[i] = 0.5;
        }

        assert!((map.mean(&energies, BandLabel::Mid) - 0.5).abs() < 1e-6);
        assert_eq!(map.mean(&energies, BandLabel::Presence), 0.0);

        // Short vector degrades to an empty slice, not a panic
        let short = vec![0.0f32; 2];
        assert_eq!(map.slice(&short, BandLabel::Presence).len(), 0);
    }
}
