//! Configuration for the fbcast device process.
//!
//! These are *initial* settings only: the host can change the
//! monochrome threshold and dithering mode at runtime through the
//! command protocol, and those changes are intentionally never written
//! back.

use std::path::Path;

use serde::{Deserialize, Serialize};

use fbcast_core::{CaptureState, DEFAULT_THRESHOLD_LEVEL, DitherMode};

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Conversion settings applied at startup.
    pub capture: CaptureSettings,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Initial conversion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Initial 8-bit monochrome threshold level.
    pub threshold: u8,
    /// Initial dithering mode (0 = none, 1 = Floyd–Steinberg,
    /// 2 = Atkinson), same values as protocol opcode 7.
    pub dithering: u8,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            capture: CaptureSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD_LEVEL,
            dithering: 0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl DeviceConfig {
    /// Load configuration from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Initial conversion state for the driver.
    pub fn to_capture_state(&self) -> CaptureState {
        let mut state = CaptureState::default();
        state.set_threshold_level(self.capture.threshold);
        state.dither = DitherMode::from(self.capture.dithering);
        state
    }
}

// ── Tests ────────────────────────────────────────────────────────
