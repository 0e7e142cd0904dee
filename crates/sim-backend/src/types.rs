use core::fmt;
use serde::{Deserialize, Serialize};

/// Quaternion (x, y, z, w) without rotation.
pub const IDENTITY_ORIENTATION: [f64; 4] = [0.0, 0.0, 0.0, 1.0];

/// Handle of a body loaded into the physics server.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct BodyId(pub u32);

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How to attach to the physics server.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConnectionMode {
    /// Interactive window with visual rendering.
    Gui,
    /// No visual rendering.
    Headless,
}

/// Position (m) and orientation (x, y, z, w) of a body base in world frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BasePose {
    pub position: [f64; 3],
    pub orientation: [f64; 4],
}

impl Default for BasePose {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            orientation: IDENTITY_ORIENTATION,
        }
    }
}

/// Flags passed to the model loader.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct LoadOptions {
    pub use_fixed_base: bool,
    /// Take inertia tensors from the description file instead of computing
    /// them from the collision shapes.
    pub inertia_from_file: bool,
    /// Enable collisions between links of the same body.
    pub self_collision: bool,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BodyInfo {
    pub base_link_name: String,
    pub body_name: String,
}

/// Joint `i` connects its parent link to the child link `link_name`; the
/// child link carries the same index as the joint.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JointInfo {
    pub index: usize,
    pub joint_name: String,
    pub link_name: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct JointState {
    pub position: f64,
    pub velocity: f64,
    /// Torque applied by the motor during the last step.
    pub motor_torque: f64,
}

/// Camera placement and intrinsics used for rendering.
#[derive(Clone, Debug, PartialEq)]
pub struct CameraView {
    pub name: String,
    pub eye: [f64; 3],
    pub target: [f64; 3],
    pub up: [f64; 3],
    pub fov_deg: f64,
    pub near: f64,
    pub far: f64,
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PixelFormat {
    Bgr8,
    Rgb8,
    Gray8,
}

impl PixelFormat {
    pub fn channels(self) -> usize {
        match self {
            PixelFormat::Bgr8 | PixelFormat::Rgb8 => 3,
            PixelFormat::Gray8 => 1,
        }
    }
}

/// Row-major pixel buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub pixel_format: PixelFormat,
    pub data: Vec<u8>,
}
