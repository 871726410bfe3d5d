//! Analysis event types
//!
//! Events are drained from the analyzer's queue after each frame. They are
//! plain data, serializable for logging or IPC, and carry the intensity
//! the host needs for driving visuals.

use serde::{Deserialize, Serialize};

use crate::features::groove::GroovePattern;
use crate::features::transition::TransitionPhase;

/// A discrete detection produced by one analysis tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BeatEvent {
    /// Kick drum onset
    Kick {
        /// Onset intensity in [0, 1]
        intensity: f32,
    },
    /// Snare onset
    Snare {
        /// Onset intensity in [0, 1]
        intensity: f32,
    },
    /// Hi-hat onset
    HiHat {
        /// Onset intensity in [0, 1]
        intensity: f32,
    },
    /// Clap onset
    Clap {
        /// Onset intensity in [0, 1]
        intensity: f32,
    },
    /// Vocal onset
    Vocal {
        /// Onset intensity in [0, 1]
        intensity: f32,
    },
    /// A consistent bass groove locked in or changed pattern
    Groove {
        /// Interval consistency in [0, 1]
        intensity: f32,
        /// Classified tempo band
        pattern: GroovePattern,
    },
    /// An energy transition phase was entered
    Transition {
        /// Phase intensity in [0, 1]
        intensity: f32,
        /// Phase that was entered
        phase: TransitionPhase,
    },
}

impl BeatEvent {
    /// Event kind as a display string
    pub fn kind(&self) -> &'static str {
        match self {
            BeatEvent::Kick { .. } => "kick",
            BeatEvent::Snare { .. } => "snare",
            BeatEvent::HiHat { .. } => "hihat",
            BeatEvent::Clap { .. } => "clap",
            BeatEvent::Vocal { .. } => "vocal",
            BeatEvent::Groove { .. } => "groove",
            BeatEvent::Transition { .. } => "transition",
        }
    }

    /// Intensity carried by the event
    pub fn intensity(&self) -> f32 {
        match self {
            BeatEvent::Kick { intensity }
            | BeatEvent::Snare { intensity }
            | BeatEvent::HiHat { intensity }
            | BeatEvent::Clap { intensity }
            | BeatEvent::Vocal { intensity }
            | BeatEvent::Groove { intensity, .. }
            | BeatEvent::Transition { intensity, .. } => *intensity,
        }
    }
}
