//! Percussive onset detection (kick / snare / hi-hat / clap)
//!
//! All four channels run the same algorithm with different band
//! assignments and cooldowns; only the parameters differ, never the code
//! path. Per tick per channel:
//!
//! 1. Honor the channel cooldown (skip while cooling)
//! 2. Compute band-scoped flux and band energy
//! 3. Push the flux into the channel's bounded history
//! 4. Fire iff `flux > adaptive_threshold` and `energy > energy_floor`
//!
//! Reported intensity is `min(1, flux / threshold)`.

use crate::error::AnalysisError;
use crate::features::flux::band_flux;
use crate::features::threshold::FluxHistory;
use crate::spectrum::bands::{BandLabel, BandMap};

/// Numerical stability epsilon
const EPSILON: f32 = 1e-6;

/// Percussive channel identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BeatChannel {
    /// Kick drum, detected in the sub-bass band
    Kick,
    /// Snare, detected in the mid band
    Snare,
    /// Hi-hat, detected in the high band
    HiHat,
    /// Clap, detected in the high-mid band
    Clap,
}

impl BeatChannel {
    /// Band this channel listens to
    pub fn band(&self) -> BandLabel {
        match self {
            BeatChannel::Kick => BandLabel::SubBass,
            BeatChannel::Snare => BandLabel::Mid,
            BeatChannel::HiHat => BandLabel::High,
            BeatChannel::Clap => BandLabel::HighMid,
        }
    }

    /// Channel name as a display string
    pub fn as_str(&self) -> &'static str {
        match self {
            BeatChannel::Kick => "Kick",
            BeatChannel::Snare => "Snare",
            BeatChannel::HiHat => "HiHat",
            BeatChannel::Clap => "Clap",
        }
    }
}

/// Per-channel cooldowns in seconds
///
/// Distinct short cooldowns keep a single hit from firing on consecutive
/// ticks while staying short enough for fast rhythmic material.
#[derive(Debug, Clone)]
pub struct PercussiveConfig {
    /// Kick cooldown (default: 0.15)
    pub kick_cooldown: f32,
    /// Snare cooldown (default: 0.12)
    pub snare_cooldown: f32,
    /// Hi-hat cooldown (default: 0.10)
    pub hihat_cooldown: f32,
    /// Clap cooldown (default: 0.12)
    pub clap_cooldown: f32,
}

impl Default for PercussiveConfig {
    fn default() -> Self {
        Self {
            kick_cooldown: 0.15,
            snare_cooldown: 0.12,
            hihat_cooldown: 0.10,
            clap_cooldown: 0.12,
        }
    }
}

impl PercussiveConfig {
    /// Cooldown for a given channel
    pub fn cooldown(&self, channel: BeatChannel) -> f32 {
        match channel {
            BeatChannel::Kick => self.kick_cooldown,
            BeatChannel::Snare => self.snare_cooldown,
            BeatChannel::HiHat => self.hihat_cooldown,
            BeatChannel::Clap => self.clap_cooldown,
        }
    }

    /// Validate cooldown values
    pub fn validate(&self) -> Result<(), AnalysisError> {
        for (name, v) in [
            ("kick", self.kick_cooldown),
            ("snare", self.snare_cooldown),
            ("hihat", self.hihat_cooldown),
            ("clap", self.clap_cooldown),
        ] {
            if !(v.is_finite() && v >= 0.0) {
                return Err(AnalysisError::InvalidConfig(format!(
                    "{} cooldown must be finite and >= 0, got {}",
                    name, v
                )));
            }
        }
        Ok(())
    }
}

/// A fired percussive onset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OnsetDetection {
    /// Channel that fired
    pub channel: BeatChannel,
    /// Onset intensity in [0, 1]
    pub intensity: f32,
}

/// One percussive detector channel: `{Idle, Cooling}` state machine
#[derive(Debug, Clone)]
pub struct ChannelDetector {
    channel: BeatChannel,
    band: BandLabel,
    cooldown: f32,
    energy_floor: f32,
    min_samples: usize,
    history: FluxHistory,
    last_fire: f32,
}

impl ChannelDetector {
    /// Create a detector for one channel
    ///
    /// # Arguments
    ///
    /// * `channel` - Channel identity (fixes the band assignment)
    /// * `cooldown` - Seconds to stay silent after a fire
    /// * `energy_floor` - Minimum band energy for a detection (typically 0.2)
    /// * `window` - Flux history length (typically 50-100)
    /// * `min_samples` - History warm-up before any detection
    pub fn new(
        channel: BeatChannel,
        cooldown: f32,
        energy_floor: f32,
        window: usize,
        min_samples: usize,
    ) -> Self {
        Self {
            channel,
            band: channel.band(),
            cooldown,
            energy_floor,
            min_samples,
            history: FluxHistory::new(window),
            last_fire: f32::NEG_INFINITY,
        }
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
    /// # Returns
    ///
    /// `Some(OnsetDetection)` when the channel fires this tick
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::NumericalError` if the band flux is
    /// non-finite; the caller treats this as "no detection this tick".
    pub fn process(
        &mut self,
        bands: &BandMap,
        curr: &[f32],
        prev: &[f32],
        now: f32,
    ) -> Result<Option<OnsetDetection>, AnalysisError> {
        // Cooling: skip the tick entirely
        if now - self.last_fire < self.cooldown {
            return Ok(None);
        }

        let flux = band_flux(bands, curr, prev, self.band);
        if !flux.is_finite() {
            return Err(AnalysisError::NumericalError(format!(
                "Non-finite flux on channel {}",
                self.channel.as_str()
            )));
        }
        let energy = bands.mean(curr, self.band);

        self.history.push(flux);

        if self.history.len() < self.min_samples {
            return Ok(None);
        }

        let threshold = self.history.adaptive_threshold();
        if flux > threshold && energy > self.energy_floor {
            let intensity = (flux / threshold.max(EPSILON)).min(1.0);
            self.last_fire = now;
            log::debug!(
                "{} onset at {:.3}s: flux={:.4}, threshold={:.4}, energy={:.3}",
                self.channel.as_str(),
                now,
                flux,
                threshold,
                energy
            );
            return Ok(Some(OnsetDetection {
                channel: self.channel,
                intensity,
            }));
        }

        Ok(None)
    }

    /// Channel identity
    pub fn channel(&self) -> BeatChannel {
        self.channel
    }

    /// Discard all state for a new playback session
    pub fn reset(&mut self) {
        self.history.clear();
        self.last_fire = f32::NEG_INFINITY;
    }
}
