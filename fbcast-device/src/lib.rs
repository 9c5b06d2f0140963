//! fbcast device process library: configuration and the built-in
//! test-pattern capture backend. The actual entry point lives in
//! `main.rs`.

pub mod config;
pub mod pattern;

pub use config::DeviceConfig;
pub use pattern::PatternBackend;
