//! Vocal presence detection
//!
//! A continuous classifier rather than a bare onset test. Every tick it
//! combines several spectral features into a presence estimate in [0, 1]:
//!
//! - weighted energy across formant/harmonic/sibilance/presence bands
//! - instrumental energy (sub-bass + bass) for rejecting bass transients
//! - spectral centroid (brightness), spectral flatness (tonality),
//!   and a harmonic-peak ratio
//!
//! All rolling histories are trimmed by elapsed wall-clock time, never by
//! sample count, so the detector behaves identically at any tick rate.
//! Presence and energy are smoothed with factors scaled by the real
//! elapsed seconds since the previous tick, for the same reason.
//!
//! Onset pulses are separate from the continuous presence signal and
//! require simultaneous energy, tonality, harmonicity, recent vocal-band
//! flux, low bass-flux correlation, and sustain over several ticks.

use std::collections::VecDeque;

use crate::error::AnalysisError;
use crate::features::flux::band_flux;
use crate::spectrum::bands::{BandLabel, BandMap};

/// Numerical stability epsilon
const EPSILON: f32 = 1e-6;

/// Fallback tick interval before two timestamps are seen
const DEFAULT_TICK_SECONDS: f32 = 1.0 / 30.0;

/// Vocal detector configuration
///
/// All constants here are empirically tuned, not analytically derived,
/// which is why every one of them is exposed.
#[derive(Debug, Clone)]
pub struct VocalConfig {
    /// Rolling history window in seconds (default: 3.5)
    pub window_seconds: f32,
    /// Sub-window for the tonality/harmonic onset gates (default: 0.5)
    pub gate_window_seconds: f32,
    /// Ticks of baseline accumulation before any detection (default: 100)
    pub calibration_ticks: u32,
    /// Minimum seconds between onset pulses (default: 0.1)
    pub onset_cooldown: f32,
    /// Continuous presence required for an onset (default: 0.3)
    pub presence_gate: f32,
    /// Rolling tonality required for an onset (default: 0.25)
    pub tonality_gate: f32,
    /// Rolling harmonic ratio required for an onset (default: 0.3)
    pub harmonic_gate: f32,
    /// Minimum recent vocal-band flux for an onset (default: 0.01)
    pub flux_gate: f32,
    /// Maximum recent bass flux as a fraction of vocal flux (default: 0.5)
    pub bass_rejection_ratio: f32,
    /// Absolute vocal-energy floor for an onset (default: 0.15)
    pub energy_floor: f32,
    /// Multiplier on the baseline for the onset energy threshold (default: 1.3)
    pub threshold_scale: f32,
    /// Weight of the instrumental baseline in the onset threshold (default: 0.5)
    pub instr_threshold_weight: f32,
    /// Raised multiplier while a recent onset is still fresh (default: 1.8)
    pub recent_threshold_scale: f32,
    /// Seconds an onset counts as recent for threshold adjustment (default: 1.0)
    pub recency_window: f32,
    /// Samples of the sustain window (default: 5)
    pub sustain_window: usize,
    /// Samples above 80% of threshold required to fire (default: 3)
    pub sustain_required: usize,
    /// Recent-flux window in ticks (default: 10)
    pub flux_memory: usize,
    /// High-frequency energy share that triggers the presence boost (default: 0.25)
    pub high_freq_boost_gate: f32,
    /// Per-tick decay of the slow maxima baselines (default: 0.995)
    pub baseline_decay: f32,
    /// Presence smoothing rate in 1/seconds (default: 8.0)
    pub presence_smoothing_rate: f32,
    /// Energy smoothing rate in 1/seconds (default: 5.0)
    pub energy_smoothing_rate: f32,
}

impl Default for VocalConfig {
    fn default() -> Self {
        Self {
            window_seconds: 3.5,
            gate_window_seconds: 0.5,
            calibration_ticks: 100,
            onset_cooldown: 0.1,
            presence_gate: 0.3,
            tonality_gate: 0.25,
            harmonic_gate: 0.3,
            flux_gate: 0.01,
            bass_rejection_ratio: 0.5,
            energy_floor: 0.15,
            threshold_scale: 1.3,
            instr_threshold_weight: 0.5,
            recent_threshold_scale: 1.8,
            recency_window: 1.0,
            sustain_window: 5,
            sustain_required: 3,
            flux_memory: 10,
            high_freq_boost_gate: 0.25,
            baseline_decay: 0.995,
            presence_smoothing_rate: 8.0,
            energy_smoothing_rate: 5.0,
        }
    }
}

impl VocalConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.window_seconds <= 0.0 || self.gate_window_seconds <= 0.0 {
            return Err(AnalysisError::InvalidConfig(
                "Vocal history windows must be > 0".to_string(),
            ));
        }
        if self.sustain_window == 0 || self.sustain_required > self.sustain_window {
            return Err(AnalysisError::InvalidConfig(format!(
                "Sustain {}-of-{} is not satisfiable",
                self.sustain_required, self.sustain_window
            )));
        }
        if self.flux_memory == 0 {
            return Err(AnalysisError::InvalidConfig(
                "Flux memory must be > 0".to_string(),
            ));
        }
        if !(self.instr_threshold_weight.is_finite() && self.instr_threshold_weight >= 0.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "Instrumental threshold weight must be finite and >= 0, got {}",
                self.instr_threshold_weight
            )));
        }
        if !(0.0..1.0).contains(&self.baseline_decay) {
            return Err(AnalysisError::InvalidConfig(format!(
                "Baseline decay must be in [0, 1), got {}",
                self.baseline_decay
            )));
        }
        Ok(())
    }
}

/// Per-tick output of the vocal detector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VocalOutput {
    /// True when an onset pulse fired this tick
    pub onset: bool,
    /// Smoothed continuous vocal presence in [0, 1]
    pub presence: f32,
}

/// Time-bounded history of (timestamp, value) pairs
#[derive(Debug, Clone, Default)]
struct TimedHistory {
    entries: VecDeque<(f32, f32)>,
}

impl TimedHistory {
    fn push(&mut self, now: f32, value: f32, window: f32) {
        self.entries.push_back((now, value));
        while let Some(&(t, _)) = self.entries.front() {
            if now - t > window {
                self.entries.pop_front();
            } else {
                break;
            }
        }
    }

    fn mean(&self) -> f32 {
        if self.entries.is_empty() {
            return 0.0;
        }
        self.entries.iter().map(|(_, v)| v).sum::<f32>() / self.entries.len() as f32
    }

    /// Mean over entries no older than `sub_window` seconds
    fn recent_mean(&self, now: f32, sub_window: f32) -> f32 {
        let mut sum = 0.0;
        let mut count = 0usize;
        for &(t, v) in self.entries.iter().rev() {
            if now - t > sub_window {
                break;
            }
            sum += v;
            count += 1;
        }
        if count == 0 {
            0.0
        } else {
            sum / count as f32
        }
    }

    /// Mean of the middle 80%, excluding outliers at both ends
    fn trimmed_mean(&self) -> f32 {
        if self.entries.len() < 5 {
            return self.mean();
        }
        let mut sorted: Vec<f32> = self.entries.iter().map(|(_, v)| *v).collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let trim = sorted.len() / 10;
        let kept = &sorted[trim..sorted.len() - trim];
        kept.iter().sum::<f32>() / kept.len() as f32
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Streaming vocal presence detector
#[derive(Debug, Clone)]
pub struct VocalDetector {
    cfg: VocalConfig,
    ticks: u64,
    last_tick_time: Option<f32>,
    vocal_hist: TimedHistory,
    instr_hist: TimedHistory,
    centroid_hist: TimedHistory,
    tonality_hist: TimedHistory,
    harmonic_hist: TimedHistory,
    max_vocal: f32,
    max_instr: f32,
    smoothed_presence: f32,
    smoothed_energy: f32,
    recent_vocal_flux: VecDeque<f32>,
    recent_bass_flux: VecDeque<f32>,
    recent_above: VecDeque<bool>,
    last_onset: f32,
}

impl VocalDetector {
    /// Create a detector with the given configuration
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidConfig` for unsatisfiable parameters
    pub fn new(cfg: VocalConfig) -> Result<Self, AnalysisError> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            ticks: 0,
            last_tick_time: None,
            vocal_hist: TimedHistory::default(),
            instr_hist: TimedHistory::default(),
            centroid_hist: TimedHistory::default(),
            tonality_hist: TimedHistory::default(),
            harmonic_hist: TimedHistory::default(),
            max_vocal: 0.0,
            max_instr: 0.0,
            smoothed_presence: 0.0,
            smoothed_energy: 0.0,
            recent_vocal_flux: VecDeque::new(),
            recent_bass_flux: VecDeque::new(),
            recent_above: VecDeque::new(),
            last_onset: f32::NEG_INFINITY,
        })
    }

    /// Run one tick of detection
    ///
    /// # Arguments
    ///
    /// * `bands` - Band map for slicing the energy vectors
    /// * `curr` - Current normalized band energies
    /// * `prev` - Previous tick's normalized band energies
    /// * `now` - Current wall-clock time in seconds
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::NumericalError` if a derived feature is
    /// non-finite; the caller treats this as "no detection this tick".
    pub fn process(
        &mut self,
        bands: &BandMap,
        curr: &[f32],
        prev: &[f32],
        now: f32,
    ) -> Result<VocalOutput, AnalysisError> {
        let dt = match self.last_tick_time {
            Some(t) => (now - t).max(0.0),
            None => DEFAULT_TICK_SECONDS,
        };
        self.last_tick_time = Some(now);

        // Feature extraction
        let vocal_energy = self.weighted_vocal_energy(bands, curr);
        let instr_energy =
            0.5 * (bands.mean(curr, BandLabel::SubBass) + bands.mean(curr, BandLabel::Bass));
        let centroid = spectral_centroid(curr);
        let tonality = 1.0 - spectral_flatness(curr);
        let harmonic = harmonic_ratio(curr);

        if !vocal_energy.is_finite() || !centroid.is_finite() || !tonality.is_finite() {
            return Err(AnalysisError::NumericalError(
                "Non-finite vocal feature".to_string(),
            ));
        }

        // Time-bounded histories
        let window = self.cfg.window_seconds;
        self.vocal_hist.push(now, vocal_energy, window);
        self.instr_hist.push(now, instr_energy, window);
        self.centroid_hist.push(now, centroid, window);
        self.tonality_hist.push(now, tonality, window);
        self.harmonic_hist.push(now, harmonic, window);

        // Slow-decaying maxima baselines
        self.max_vocal = (self.max_vocal * self.cfg.baseline_decay).max(vocal_energy);
        self.max_instr = (self.max_instr * self.cfg.baseline_decay).max(instr_energy);

        // Recent flux memory for the onset gates
        let vocal_flux = band_flux(bands, curr, prev, BandLabel::Formant)
            + band_flux(bands, curr, prev, BandLabel::Harmonic);
        let bass_flux = band_flux(bands, curr, prev, BandLabel::SubBass)
            + band_flux(bands, curr, prev, BandLabel::Bass);
        push_bounded(&mut self.recent_vocal_flux, vocal_flux, self.cfg.flux_memory);
        push_bounded(&mut self.recent_bass_flux, bass_flux, self.cfg.flux_memory);

        // Calibration: accumulate baselines only, never detect
        if self.ticks < u64::from(self.cfg.calibration_ticks) {
            self.ticks += 1;
            return Ok(VocalOutput {
                onset: false,
                presence: 0.0,
            });
        }
        self.ticks += 1;

        // Continuous presence estimate, normalized against the decaying
        // maxima so a bass-heavy mix cannot dominate the ratio just by
        // being louder overall
        let rel_vocal = (vocal_energy / (self.max_vocal + EPSILON)).clamp(0.0, 1.0);
        let rel_instr = (instr_energy / (self.max_instr + EPSILON)).clamp(0.0, 1.0);
        let energy_ratio = rel_vocal / (rel_vocal + rel_instr + EPSILON);
        let absolute_vocal = rel_vocal;
        let rolling_centroid = self.centroid_hist.recent_mean(now, self.cfg.gate_window_seconds);
        let spectral_balance = (rolling_centroid / 0.25).clamp(0.0, 1.0);
        let rolling_tonality = self.tonality_hist.recent_mean(now, self.cfg.gate_window_seconds);
        let high_freq = 0.5
            * (bands.mean(curr, BandLabel::Sibilance) + bands.mean(curr, BandLabel::Presence));
        let high_freq_boost = if high_freq > self.cfg.high_freq_boost_gate {
            0.2
        } else {
            0.0
        };

        let raw_presence = (0.25 * energy_ratio
            + 0.25 * absolute_vocal
            + 0.2 * spectral_balance
            + 0.2 * rolling_tonality.clamp(0.0, 1.0)
            + high_freq_boost)
            .clamp(0.0, 1.0);

        // Real-time-delta-based smoothing: identical behavior at any tick rate
        let presence_factor = (self.cfg.presence_smoothing_rate * dt).clamp(0.0, 1.0);
        let energy_factor = (self.cfg.energy_smoothing_rate * dt).clamp(0.0, 1.0);
        self.smoothed_presence += presence_factor * (raw_presence - self.smoothed_presence);
        self.smoothed_energy += energy_factor * (vocal_energy - self.smoothed_energy);

        // Onset threshold, adjusted by onset recency and raised by the
        // instrumental baseline so a loud mix needs a louder vocal
        let baseline = self.vocal_hist.trimmed_mean();
        let instr_baseline = self.instr_hist.trimmed_mean();
        let scale = if now - self.last_onset < self.cfg.recency_window {
            self.cfg.recent_threshold_scale
        } else {
            self.cfg.threshold_scale
        };
        let threshold = (baseline * scale + self.cfg.instr_threshold_weight * instr_baseline)
            .max(self.cfg.energy_floor);

        push_bounded_bool(
            &mut self.recent_above,
            vocal_energy > 0.8 * threshold,
            self.cfg.sustain_window,
        );
        let sustained =
            self.recent_above.iter().filter(|&&b| b).count() >= self.cfg.sustain_required;

        let peak_vocal_flux = self
            .recent_vocal_flux
            .iter()
            .copied()
            .fold(0.0f32, f32::max);
        let peak_bass_flux = self.recent_bass_flux.iter().copied().fold(0.0f32, f32::max);
        let rolling_harmonic = self.harmonic_hist.recent_mean(now, self.cfg.gate_window_seconds);

        let onset = now - self.last_onset >= self.cfg.onset_cooldown
            && vocal_energy > threshold
            && self.smoothed_presence > self.cfg.presence_gate
            && rolling_tonality > self.cfg.tonality_gate
            && rolling_harmonic > self.cfg.harmonic_gate
            && peak_vocal_flux > self.cfg.flux_gate
            && peak_bass_flux < self.cfg.bass_rejection_ratio * peak_vocal_flux
            && sustained;

        if onset {
            self.last_onset = now;
            // Re-arm: a fresh attack is required before the next pulse
            self.recent_vocal_flux.clear();
            self.recent_bass_flux.clear();
            self.recent_above.clear();
            log::debug!(
                "Vocal onset at {:.3}s: energy={:.3}, threshold={:.3}, presence={:.3}",
                now,
                vocal_energy,
                threshold,
                self.smoothed_presence
            );
        }

        Ok(VocalOutput {
            onset,
            presence: self.smoothed_presence,
        })
    }

    /// Current smoothed presence in [0, 1]
    pub fn presence(&self) -> f32 {
        self.smoothed_presence
    }

    /// Current smoothed vocal energy
    pub fn smoothed_energy(&self) -> f32 {
        self.smoothed_energy
    }

    /// Onset intensity for the most recent tick's threshold
    pub(crate) fn onset_intensity(&self) -> f32 {
        (self.smoothed_energy / (self.vocal_hist.trimmed_mean().max(self.cfg.energy_floor) + EPSILON))
            .clamp(0.0, 1.0)
    }

    /// Discard all state for a new playback session (fresh calibration)
    pub fn reset(&mut self) {
        self.ticks = 0;
        self.last_tick_time = None;
        self.vocal_hist.clear();
        self.instr_hist.clear();
        self.centroid_hist.clear();
        self.tonality_hist.clear();
        self.harmonic_hist.clear();
        self.max_vocal = 0.0;
        self.max_instr = 0.0;
        self.smoothed_presence = 0.0;
        self.smoothed_energy = 0.0;
        self.recent_vocal_flux.clear();
        self.recent_bass_flux.clear();
        self.recent_above.clear();
        self.last_onset = f32::NEG_INFINITY;
    }

    /// Weighted energy across the vocal sub-bands
    ///
    /// Formants carry the most weight; sibilance and presence the least.
    fn weighted_vocal_energy(&self, bands: &BandMap, curr: &[f32]) -> f32 {
        let formant = bands.mean(curr, BandLabel::Formant);
        let harmonic = bands.mean(curr, BandLabel::Harmonic);
        let sibilance = bands.mean(curr, BandLabel::Sibilance);
        let presence = bands.mean(curr, BandLabel::Presence);
        (1.0 * formant + 0.7 * harmonic + 0.4 * sibilance + 0.4 * presence) / 2.5
    }
}

fn push_bounded(queue: &mut VecDeque<f32>, value: f32, cap: usize) {
    if queue.len() == cap {
        queue.pop_front();
    }
    queue.push_back(value.max(0.0));
}

fn push_bounded_bool(queue: &mut VecDeque<bool>, value: bool, cap: usize) {
    if queue.len() == cap {
        queue.pop_front();
    }
    queue.push_back(value);
}

/// Energy-weighted mean index, normalized to [0, 1]
///
/// Higher values indicate brighter, more vocal-like timbre.
pub fn spectral_centroid(energies: &[f32]) -> f32 {
    if energies.len() < 2 {
        return 0.0;
    }
    let total: f32 = energies.iter().sum();
    if total < EPSILON {
        return 0.0;
    }
    let weighted: f32 = energies
        .iter()
        .enumerate()
        .map(|(i, &v)| i as f32 * v)
        .sum();
    (weighted / total) / (energies.len() - 1) as f32
}

/// Geometric mean over arithmetic mean, in [0, 1]
///
/// Lower values indicate tonal (voice-like) content; higher values
/// indicate noise. Returns 1.0 (maximally flat) for silence so silence
/// never reads as tonal.
pub fn spectral_flatness(energies: &[f32]) -> f32 {
    if energies.is_empty() {
        return 1.0;
    }
    let arith = energies.iter().sum::<f32>() / energies.len() as f32;
    if arith < EPSILON {
        return 1.0;
    }
    let log_sum: f32 = energies.iter().map(|&v| (v + EPSILON).ln()).sum();
    let geo = (log_sum / energies.len() as f32).exp();
    (geo / arith).clamp(0.0, 1.0)
}

/// Harmonic-peak ratio in [0, 1]
///
/// Fraction of entries that are strict local maxima, scaled by the ratio
/// of total energy to non-peak energy. A peaky, comb-like spectrum (a
/// proxy for harmonics) scores high; a flat or noisy one scores low.
pub fn harmonic_ratio(energies: &[f32]) -> f32 {
    if energies.len() < 3 {
        return 0.0;
    }
    let total: f32 = energies.iter().sum();
    if total < EPSILON {
        return 0.0;
    }
    let mut peak_count = 0usize;
    let mut peak_energy = 0.0f32;
    for i in 1..energies.len() - 1 {
        if energies[i] > energies[i - 1] && energies[i] > energies[i + 1] {
            peak_count += 1;
            peak_energy += energies[i];
        }
    }
    let fraction = peak_count as f32 / (energies.len() - 2) as f32;
    let scale = total / (total - peak_energy + EPSILON);
    (fraction * scale).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: f32 = 0.03;

    /// Comb-like tonal spectrum in the formant/harmonic region
    ///
    /// Starts above the bass bands so the signal is bass-uncorrelated.
    fn vocal_vector(bands: &BandMap) -> Vec<f32> {
        let mut v = vec![0.0f32; 64];
        let formant = bands.range(BandLabel::Formant);
        let harmonic = bands.range(BandLabel::Harmonic);
        for i in (formant.lo.max(2)..=harmonic.hi).step_by(2) {
            v[i] = 0.8;
        }
        v
    }

    fn bass_vector(bands: &BandMap) -> Vec<f32> {
        let mut v = vec![0.0f32; 64];
        let r = bands.range(BandLabel::SubBass);
        for i in r.lo..=r.hi {
            v[i] = 0.9;
        }
        v
    }

    fn run_calibration(det: &mut VocalDetector, bands: &BandMap) -> f32 {
        let silent = vec![0.0f32; 64];
        let mut now = 0.0;
        for _ in 0..100 {
            let out = det.process(bands, &silent, &silent, now).unwrap();
            assert!(!out.onset, "no onset may fire during calibration");
            assert_eq!(out.presence, 0.0, "presence is gated during calibration");
            now += TICK;
        }
        now
    }

    #[test]
    fn test_spectral_centroid() {
        assert_eq!(spectral_centroid(&[0.0, 0.0, 0.0]), 0.0);
        // All energy in the last entry
        let c = spectral_centroid(&[0.0, 0.0, 0.0, 1.0]);
        assert!((c - 1.0).abs() < 1e-6);
        // Symmetric energy centers at 0.5
        let c = spectral_centroid(&[1.0, 0.0, 1.0]);
        assert!((c - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_spectral_flatness() {
        // Silence is maximally flat
        assert_eq!(spectral_flatness(&[0.0; 8]), 1.0);
        // Uniform noise is flat
        assert!(spectral_flatness(&[0.5; 16]) > 0.95);
        // A single dominant peak is tonal
        let mut peaky = vec![0.0f32; 16];
        peaky[4] = 1.0;
        assert!(spectral_flatness(&peaky) < 0.1);
    }

    #[test]
    fn test_harmonic_ratio() {
        assert_eq!(harmonic_ratio(&[0.0; 8]), 0.0);
        // Comb spectrum: strong local maxima carrying all the energy
        let comb = [0.0, 0.8, 0.0, 0.8, 0.0, 0.8, 0.0, 0.8, 0.0];
        assert!(harmonic_ratio(&comb) > 0.5);
        // Flat spectrum has no local maxima
        assert_eq!(harmonic_ratio(&[0.5; 8]), 0.0);
    }

    #[test]
    fn test_no_onset_during_calibration() {
        let bands = BandMap::new(44100, 64).unwrap();
        let mut det = VocalDetector::new(VocalConfig::default()).unwrap();
        let vocal = vocal_vector(&bands);
        let silent = vec![0.0f32; 64];

        // Even a strong vocal-like signal must not fire while calibrating
        let mut now = 0.0;
        let mut prev: &[f32] = &silent;
        for _ in 0..100 {
            let out = det.process(&bands, &vocal, prev, now).unwrap();
            assert!(!out.onset);
            assert_eq!(out.presence, 0.0);
            prev = &vocal;
            now += TICK;
        }
    }

    #[test]
    fn test_sustained_tonal_signal_fires_once() {
        let bands = BandMap::new(44100, 64).unwrap();
        let mut det = VocalDetector::new(VocalConfig::default()).unwrap();
        let mut now = run_calibration(&mut det, &bands);

        let vocal = vocal_vector(&bands);
        let silent = vec![0.0f32; 64];

        let mut onsets = 0;
        let mut prev: &[f32] = &silent;
        for _ in 0..20 {
            let out = det.process(&bands, &vocal, prev, now).unwrap();
            if out.onset {
                onsets += 1;
            }
            prev = &vocal;
            now += TICK;
        }

        assert_eq!(
            onsets, 1,
            "a sustained tonal signal should fire exactly one onset"
        );
    }

    #[test]
    fn test_presence_rises_on_vocal_content() {
        let bands = BandMap::new(44100, 64).unwrap();
        let mut det = VocalDetector::new(VocalConfig::default()).unwrap();
        let mut now = run_calibration(&mut det, &bands);

        let vocal = vocal_vector(&bands);
        let silent = vec![0.0f32; 64];
        let mut prev: &[f32] = &silent;
        let mut last = 0.0;
        for _ in 0..30 {
            last = det.process(&bands, &vocal, prev, now).unwrap().presence;
            prev = &vocal;
            now += TICK;
        }
        assert!(
            last > 0.4,
            "sustained vocal content should raise presence, got {}",
            last
        );
        assert!(last <= 1.0);
    }

    #[test]
    fn test_bass_transient_rejected() {
        let bands = BandMap::new(44100, 64).unwrap();
        let mut det = VocalDetector::new(VocalConfig::default()).unwrap();
        let mut now = run_calibration(&mut det, &bands);

        let bass = bass_vector(&bands);
        let silent = vec![0.0f32; 64];
        let mut prev: &[f32] = &silent;
        for _ in 0..20 {
            let out = det.process(&bands, &bass, prev, now).unwrap();
            assert!(!out.onset, "pure bass transients must not fire vocal onsets");
            prev = &bass;
            now += TICK;
        }
    }

    #[test]
    fn test_bass_heavy_mix_raises_onset_threshold() {
        let bands = BandMap::new(44100, 64).unwrap();
        let vocal = vocal_vector(&bands);
        let silent = vec![0.0f32; 64];

        // Control: over silence the same vocal entry fires
        let mut control = VocalDetector::new(VocalConfig::default()).unwrap();
        let mut now = run_calibration(&mut control, &bands);
        let mut fired = false;
        let mut prev: &[f32] = &silent;
        for _ in 0..30 {
            fired |= control.process(&bands, &vocal, prev, now).unwrap().onset;
            prev = &vocal;
            now += TICK;
        }
        assert!(fired, "vocal entry over silence should fire an onset");

        // Over a loud steady bass bed the instrumental baseline raises
        // the threshold above the same vocal's energy
        let mut det = VocalDetector::new(VocalConfig::default()).unwrap();
        let bass = bass_vector(&bands);
        let mut mix = vocal_vector(&bands);
        let r = bands.range(BandLabel::SubBass);
        for i in r.lo..=r.hi {
            mix[i] = 0.9;
        }

        let mut now = 0.0;
        for _ in 0..100 {
            let out = det.process(&bands, &bass, &bass, now).unwrap();
            assert!(!out.onset);
            now += TICK;
        }
        let mut prev: &[f32] = &bass;
        for _ in 0..30 {
            let out = det.process(&bands, &mix, prev, now).unwrap();
            assert!(
                !out.onset,
                "vocal entry over a loud bass bed must stay below the threshold"
            );
            prev = &mix;
            now += TICK;
        }
    }

    #[test]
    fn test_presence_frame_rate_independence() {
        let bands = BandMap::new(44100, 64).unwrap();
        let vocal = vocal_vector(&bands);
        let silent = vec![0.0f32; 64];

        // Same wall-clock span at two tick rates should land close
        let run = |tick: f32| -> f32 {
            let mut cfg = VocalConfig::default();
            cfg.calibration_ticks = 0;
            let mut det = VocalDetector::new(cfg).unwrap();
            let mut now = 0.0;
            let mut prev: &[f32] = &silent;
            let steps = (1.2 / tick) as usize;
            let mut presence = 0.0;
            for _ in 0..steps {
                presence = det.process(&bands, &vocal, prev, now).unwrap().presence;
                prev = &vocal;
                now += tick;
            }
            presence
        };

        let fast = run(0.015);
        let slow = run(0.03);
        assert!(
            (fast - slow).abs() < 0.1,
            "presence should be tick-rate independent: {} vs {}",
            fast,
            slow
        );
    }

    #[test]
    fn test_reset_restores_calibration() {
        let bands = BandMap::new(44100, 64).unwrap();
        let mut det = VocalDetector::new(VocalConfig::default()).unwrap();
        let now = run_calibration(&mut det, &bands);

        let vocal = vocal_vector(&bands);
        let silent = vec![0.0f32; 64];
        det.process(&bands, &vocal, &silent, now).unwrap();
        det.reset();

        // After reset the detector is calibrating again
        let out = det.process(&bands, &vocal, &silent, now + TICK).unwrap();
        assert!(!out.onset);
        assert_eq!(out.presence, 0.0);
    }

    #[test]
    fn test_config_validation() {
        assert!(VocalConfig::default().validate().is_ok());

        let mut bad = VocalConfig::default();
        bad.sustain_required = 6;
        assert!(bad.validate().is_err());

        let mut bad = VocalConfig::default();
        bad.baseline_decay = 1.0;
        assert!(bad.validate().is_err());

        let mut bad = VocalConfig::default();
        bad.window_seconds = 0.0;
        assert!(bad.validate().is_err());
    }
}
