//! Platform settings and their YAML loader.

use crate::sim_finger::DEFAULT_TIME_STEP_S;
use crate::Pose;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Construction parameters of a [`crate::TriFingerPlatform`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlatformConfig {
    /// Open an interactive window
    pub visualization: bool,
    /// Render camera observations; expensive, so off by default
    pub enable_cameras: bool,
    /// Camera frame rate. Kept for API compatibility; observations are
    /// currently updated in every step regardless of this value.
    pub camera_rate_fps: f64,
    /// Control period (s)
    pub time_step_s: f64,
    /// Initial cube pose; sampled randomly when unset
    pub initial_object_pose: Option<Pose>,
    /// Directory of the robot description package; looked up when unset
    pub asset_root: Option<PathBuf>,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            visualization: false,
            enable_cameras: false,
            camera_rate_fps: 30.0,
            time_step_s: DEFAULT_TIME_STEP_S,
            initial_object_pose: None,
            asset_root: None,
        }
    }
}

impl PlatformConfig {
    /// Number of control steps between two camera frames.
    pub fn camera_update_step_interval(&self) -> f64 {
        (1.0 / self.camera_rate_fps) / self.time_step_s
    }
}

pub fn load_config_file(path: impl AsRef<Path>) -> anyhow::Result<PlatformConfig> {
    let path = path.as_ref();
    let raw =
        fs::read_to_string(path).with_context(|| format!("reading config: {}", path.display()))?;
    let config: PlatformConfig =
        serde_yaml::from_str(&raw).with_context(|| format!("parsing yaml: {}", path.display()))?;
    anyhow::ensure!(
        config.time_step_s > 0.0,
        "time_step_s must be positive in {}",
        path.display()
    );
    Ok(config)
}
