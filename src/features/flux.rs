//! Spectral flux computation
//!
//! Flux is the frame-to-frame energy change summed over only the
//! *positive* deltas. Beats are onsets (sudden increases); counting
//! decays as well would make sustained tones read as continuous beats.

use crate::spectrum::bands::{BandLabel, BandMap};

/// Flux between two energy vectors: sum of positive deltas
///
/// Zips the two vectors, so mismatched lengths are handled by truncating
/// to the shorter one. Always returns a value >= 0; identical vectors
/// yield exactly 0.
///
/// # Example
///
/// ```
/// use pulse_dsp::features::flux::spectral_flux;
///
/// let prev = [0.2, 0.5, 0.8];
/// let curr = [0.4, 0.3, 0.8];
/// // Only the +0.2 rise in the first entry counts
/// assert!((spectral_flux(&curr, &prev) - 0.2).abs() < 1e-6);
/// ```
pub fn spectral_flux(curr: &[f32], prev: &[f32]) -> f32 {
    curr.iter()
        .zip(prev.iter())
        .map(|(c, p)| (c - p).max(0.0))
        .sum()
}

/// Flux weighted toward lower-frequency entries
///
/// Applies a linear weight from 1.5 at index 0 down to 1.0 at the last
/// index, so bass-heavy onsets score higher than equal-magnitude changes
/// in the high bands.
pub fn weighted_flux(curr: &[f32], prev: &[f32]) -> f32 {
    let len = curr.len().min(prev.len());
    if len == 0 {
        return 0.0;
    }
    let span = (len - 1).max(1) as f32;

    curr.iter()
        .zip(prev.iter())
        .enumerate()
        .map(|(i, (c, p))| {
            let weight = 1.5 - 0.5 * (i as f32 / span);
            (c - p).max(0.0) * weight
        })
        .sum()
}

/// Flux restricted to one named band
pub fn band_flux(bands: &BandMap, curr: &[f32], prev: &[f32], label: BandLabel) -> f32 {
    spectral_flux(bands.slice(curr, label), bands.slice(prev, label))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flux_is_non_negative() {
        // Decaying energy must contribute nothing
        let prev = [1.0, 0.9, 0.8, 0.7];
        let curr = [0.0, 0.0, 0.0, 0.0];
        assert_eq!(spectral_flux(&curr, &prev), 0.0);
        assert_eq!(weighted_flux(&curr, &prev), 0.0);
    }

    #[test]
    fn test_flux_identical_vectors() {
        let v = [0.3, 0.6, 0.1, 0.9];
        assert_eq!(spectral_flux(&v, &v), 0.0);
        assert_eq!(weighted_flux(&v, &v), 0.0);
    }

    #[test]
    fn test_flux_counts_only_rises() {
        let prev = [0.2, 0.8, 0.4];
        let curr = [0.5, 0.2, 0.6];
        // Rises: 0.3 + 0.2
        assert!((spectral_flux(&curr, &prev) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_weighted_flux_favors_low_bands() {
        let prev = [0.0, 0.0, 0.0, 0.0];
        let low_rise = [1.0, 0.0, 0.0, 0.0];
        let high_rise = [0.0, 0.0, 0.0, 1.0];

        let low = weighted_flux(&low_rise, &prev);
        let high = weighted_flux(&high_rise, &prev);
        assert!(
            low > high,
            "low-band rise should outweigh high-band rise: {} vs {}",
            low,
            high
        );
        assert!((low - 1.5).abs() < 1e-6);
        assert!((high - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_flux_mismatched_lengths() {
        let prev = [0.0, 0.0];
        let curr = [1.0, 1.0, 1.0];
        // Truncates to the shorter vector
        assert!((spectral_flux(&curr, &prev) - 2.0).abs() < 1e-6);
        assert_eq!(spectral_flux(&[], &prev), 0.0);
        assert_eq!(weighted_flux(&[], &[]), 0.0);
    }

    #[test]
    fn test_band_flux_scoped() {
        let bands = BandMap::new(44100, 64).unwrap();
        let prev = vec![0.0f32; 64];
        let mut curr = vec![0.0f32; 64];

        let r = bands.range(BandLabel::SubBass);
        for i in r.lo..=r.hi {
            curr[i] = 1.0;
        }

        assert!(band_flux(&bands, &curr, &prev, BandLabel::SubBass) > 0.0);
        assert_eq!(band_flux(&bands, &curr, &prev, BandLabel::High), 0.0);
    }
}
