//! Feature extraction and streaming detectors
//!
//! Everything in this module operates on normalized band-energy vectors
//! produced by the spectrum stage. Each detector is a small state machine
//! fed one tick at a time; none of them looks ahead.

pub mod flux;
pub mod groove;
pub mod percussive;
pub mod threshold;
pub mod transition;
pub mod vocal;
