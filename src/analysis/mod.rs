//! Analyzer facade and event types

pub mod analyzer;
pub mod events;

pub use analyzer::SpectrumAnalyzer;
pub use events::BeatEvent;
