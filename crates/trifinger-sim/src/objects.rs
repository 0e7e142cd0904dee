//! The manipulated cube and its initial pose.

use crate::assets::AssetRoot;
use crate::{Pose, Result};
use rand::Rng;
use sim_backend::{BasePose, BodyId, LoadOptions, PhysicsBackend};
use std::f64::consts::PI;

/// Edge length of the cube (m).
pub const CUBE_WIDTH: f64 = 0.065;

/// Radius of the arena floor (m).
pub const ARENA_RADIUS: f64 = 0.195;

/// Largest distance of the cube centre from the arena centre such that the
/// cube stays inside the arena in any orientation.
pub fn max_cube_com_distance_to_center() -> f64 {
    ARENA_RADIUS - CUBE_WIDTH * 3f64.sqrt() / 2.0
}

/// Uniform position on the arena floor with a random rotation about z.
pub fn sample_initial_pose<R: Rng>(rng: &mut R) -> Pose {
    let radius = max_cube_com_distance_to_center() * rng.gen::<f64>().sqrt();
    let theta = rng.gen_range(0.0..2.0 * PI);
    let yaw = rng.gen_range(0.0..2.0 * PI);
    Pose {
        position: [radius * theta.cos(), radius * theta.sin(), CUBE_WIDTH / 2.0],
        orientation: yaw_quaternion(yaw),
    }
}

/// Quaternion (x, y, z, w) of a rotation by `yaw` about the z axis.
pub fn yaw_quaternion(yaw: f64) -> [f64; 4] {
    [0.0, 0.0, (yaw / 2.0).sin(), (yaw / 2.0).cos()]
}

/// Cube body living in the physics backend.
#[derive(Debug, Clone, Copy)]
pub struct Block {
    body: BodyId,
}

impl Block {
    pub fn new<B: PhysicsBackend>(backend: &mut B, assets: &AssetRoot, pose: Pose) -> Result<Self> {
        let body = backend.load_model(&assets.cube_urdf_path(), pose.into(), LoadOptions::default())?;
        tracing::debug!(body = %body, position = ?pose.position, "cube loaded");
        Ok(Self { body })
    }

    pub fn body(&self) -> BodyId {
        self.body
    }

    /// Current pose as reported by the backend.
    pub fn get_state<B: PhysicsBackend>(&self, backend: &B) -> Result<BasePose> {
        Ok(backend.base_pose(self.body)?)
    }

    pub fn set_state<B: PhysicsBackend>(&self, backend: &mut B, pose: Pose) -> Result<()> {
        Ok(backend.reset_base_pose(self.body, pose.into())?)
    }
}
