//! # pulse-dsp
//!
//! Streaming spectrum analysis for music-reactive applications.
//!
//! The crate consumes pre-computed FFT magnitude frames one tick at a time
//! and classifies what the music is doing right now: percussive onsets
//! (kick, snare, hi-hat, clap), vocal presence and vocal onsets, bassline
//! groove and tempo, and energy build-ups and drops. There is no lookahead
//! and no waveform access; every output is derived from the current frame
//! plus bounded history, so the analyzer runs comfortably inside a frame
//! budget at 30-60 ticks per second.
//!
//! ## Architecture
//!
//! ```text
//! FFT frames -> BandAggregator -> normalized band energies
//!                                      |
//!                 +--------------------+--------------------+
//!                 |                    |                    |
//!          ChannelDetector x4    VocalDetector       GrooveDetector
//!          (kick/snare/          (presence +         TransitionDetector
//!           hihat/clap)           onsets)            (build/drop)
//!                 |                    |                    |
//!                 +--------------------+--------------------+
//!                                      |
//!                               BeatEvent queue
//! ```
//!
//! ## Example
//!
//! ```
//! use pulse_dsp::{SpectrumAnalyzer, SpectrumFrame};
//!
//! let mut analyzer = SpectrumAnalyzer::new(44100)?;
//!
//! // One tick: 512 magnitude bins from a 1024-point FFT
//! let bins = vec![0.0f32; 512];
//! analyzer.push_frame(SpectrumFrame {
//!     bins: &bins,
//!     fft_size: 1024,
//!     sample_rate: 44100,
//!     now_seconds: 0.0,
//! })?;
//!
//! for event in analyzer.poll_events() {
//!     println!("{}: {:.2}", event.kind(), event.intensity());
//! }
//! # Ok::<(), pulse_dsp::AnalysisError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod features;
pub mod library;
pub mod spectrum;

pub use analysis::{BeatEvent, SpectrumAnalyzer};
pub use config::AnalyzerConfig;
pub use error::AnalysisError;
pub use features::groove::{GroovePattern, GrooveState};
pub use features::transition::{TransitionPhase, TransitionState};
pub use library::{MemoryTrackRepository, TrackEntry, TrackRepository};
pub use spectrum::bands::{BandLabel, BandMap};
pub use spectrum::SpectrumFrame;
