//! Configuration loading and typed config structures for the CarbonScape scene.
//!
//! The canonical configuration lives in `carbonscape.yaml` next to the
//! viewer. This module defines strongly-typed structs that mirror the YAML
//! structure, and provides a loader that reads the file and applies
//! environment overrides. Every field has a default, so an empty file (or
//! no file at all) yields the stock scene.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::smoothing::Blend;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level scene configuration.
///
/// Mirrors the structure of `carbonscape.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SceneConfig {
    /// Projection backend connection settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Local persistence settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Year timeline settings.
    #[serde(default)]
    pub timeline: TimelineConfig,

    /// Ambient driver settings.
    #[serde(default)]
    pub ambient: AmbientConfig,

    /// Smoothing policies.
    #[serde(default)]
    pub smoothing: SmoothingConfig,

    /// Forest pool settings.
    #[serde(default)]
    pub forest: ForestConfig,

    /// Render loop settings.
    #[serde(default)]
    pub render: RenderConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SceneConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `CARBONSCAPE_API_URL` overrides `backend.base_url`
    /// - `CARBONSCAPE_STORE_DIR` overrides `storage.dir`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // serde_yml maps an empty document to unit, not to an empty mapping.
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Override connection settings with environment variables when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("CARBONSCAPE_API_URL") {
            self.backend.base_url = val;
        }
        if let Ok(val) = std::env::var("CARBONSCAPE_STORE_DIR") {
            self.storage.dir = val;
        }
    }
}

/// Projection backend connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the backend, without a trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in milliseconds. A timeout counts as a transport
    /// failure and takes the same fallback path.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl BackendConfig {
    /// Request timeout as a [`Duration`].
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// Local persistence settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the persisted identity and cached projections.
    #[serde(default = "default_storage_dir")]
    pub dir: String,

    /// Key namespace for every persisted record.
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
            namespace: default_namespace(),
        }
    }
}

/// Year timeline settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TimelineConfig {
    /// Wall-clock milliseconds between autoplay advances.
    #[serde(default = "default_advance_period_ms")]
    pub advance_period_ms: u64,

    /// Whether the timeline starts playing once years are known.
    #[serde(default = "default_true")]
    pub autoplay: bool,
}

impl TimelineConfig {
    /// Advance period as a [`Duration`].
    pub const fn advance_period(&self) -> Duration {
        Duration::from_millis(self.advance_period_ms)
    }
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            advance_period_ms: default_advance_period_ms(),
            autoplay: true,
        }
    }
}

/// Ambient driver settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AmbientConfig {
    /// Milliseconds between ambient pulses.
    #[serde(default = "default_ambient_period_ms")]
    pub period_ms: u64,

    /// Emission level increment per pulse.
    #[serde(default = "default_ambient_step")]
    pub step: f64,
}

impl AmbientConfig {
    /// Pulse period as a [`Duration`].
    pub const fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

impl Default for AmbientConfig {
    fn default() -> Self {
        Self {
            period_ms: default_ambient_period_ms(),
            step: default_ambient_step(),
        }
    }
}

/// Smoothing policies for the two blend rates used by the scene.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SmoothingConfig {
    /// Entities, ground, lake, and forest slots.
    #[serde(default = "default_entity_blend")]
    pub entity: Blend,

    /// Sky background and fog.
    #[serde(default = "default_sky_blend")]
    pub sky: Blend,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            entity: default_entity_blend(),
            sky: default_sky_blend(),
        }
    }
}

/// Forest pool settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ForestConfig {
    /// Tree count at full coverage.
    #[serde(default = "default_forest_capacity")]
    pub capacity: u32,

    /// Inner radius of the ring trees are planted on.
    #[serde(default = "default_inner_radius")]
    pub inner_radius: f64,

    /// Width of the planting ring.
    #[serde(default = "default_ring_width")]
    pub ring_width: f64,

    /// Seed for slot placement, for reproducible layouts.
    #[serde(default = "default_forest_seed")]
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            capacity: default_forest_capacity(),
            inner_radius: default_inner_radius(),
            ring_width: default_ring_width(),
            seed: default_forest_seed(),
        }
    }
}

/// Render loop settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RenderConfig {
    /// Milliseconds between render ticks in the headless viewer.
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,

    /// Floor entity health targets at `0.1` so orbits never fully stop.
    ///
    /// With the floor applied the critical tint can never trigger, so it is
    /// off by default.
    #[serde(default)]
    pub keep_moving: bool,
}

impl RenderConfig {
    /// Frame interval as a [`Duration`].
    pub const fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: default_frame_interval_ms(),
            keep_moving: false,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error), used when `RUST_LOG`
    /// is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log a frame summary every N render ticks (0 disables).
    #[serde(default = "default_frame_log_every")]
    pub frame_log_every: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            frame_log_every: default_frame_log_every(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_owned()
}

const fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_storage_dir() -> String {
    ".carbonscape".to_owned()
}

fn default_namespace() -> String {
    "carbonscape".to_owned()
}

const fn default_advance_period_ms() -> u64 {
    4000
}

const fn default_ambient_period_ms() -> u64 {
    200
}

const fn default_ambient_step() -> f64 {
    0.01
}

const fn default_entity_blend() -> Blend {
    Blend::PerTick(0.05)
}

const fn default_sky_blend() -> Blend {
    Blend::PerTick(0.02)
}

const fn default_forest_capacity() -> u32 {
    100
}

const fn default_inner_radius() -> f64 {
    9.0
}

const fn default_ring_width() -> f64 {
    1.0
}

const fn default_forest_seed() -> u64 {
    42
}

const fn default_frame_interval_ms() -> u64 {
    16
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_frame_log_every() -> u64 {
    300
}

const fn default_true() -> bool {
    true
}
