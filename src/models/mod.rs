//! Data models and structures for the latency harness

pub mod config;
pub mod sample;

// Re-export main model types
pub use config::Config;
pub use sample::{Sample, SampleImage};
