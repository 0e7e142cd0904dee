use crate::{
    BackendError, BasePose, BodyId, BodyInfo, CameraView, ConnectionMode, Image, JointInfo,
    JointState, LoadOptions, Result,
};
use std::path::Path;

/// A minimal blocking interface to a rigid-body physics server.
///
/// One value represents one exclusively owned connection. Implementations
/// must fail with [`BackendError::NotConnected`] for any call that needs a
/// live server while disconnected.
pub trait PhysicsBackend {
    /// Attach to the server in the given mode.
    fn connect(&mut self, mode: ConnectionMode) -> Result<()>;

    fn is_connected(&self) -> bool;

    /// Detach from the server; all loaded bodies are dropped.
    fn disconnect(&mut self) -> Result<()>;

    /// Length of one `step_simulation` call in seconds.
    fn set_time_step(&mut self, dt: f64) -> Result<()>;

    /// Load an articulated body from a robot description file.
    fn load_model(&mut self, path: &Path, base: BasePose, options: LoadOptions) -> Result<BodyId>;

    fn body_info(&self, body: BodyId) -> Result<BodyInfo>;

    fn num_joints(&self, body: BodyId) -> Result<usize>;

    fn joint_info(&self, body: BodyId, joint: usize) -> Result<JointInfo>;

    /// Teleport a joint to the given state, bypassing the dynamics.
    fn reset_joint_state(
        &mut self,
        body: BodyId,
        joint: usize,
        position: f64,
        velocity: f64,
    ) -> Result<()>;

    fn joint_states(&self, body: BodyId, joints: &[usize]) -> Result<Vec<JointState>>;

    /// Set the motor torques applied during the following steps.
    fn set_joint_torques(&mut self, body: BodyId, joints: &[usize], torques: &[f64])
        -> Result<()>;

    /// Advance the simulation by one time step.
    fn step_simulation(&mut self) -> Result<()>;

    fn base_pose(&self, body: BodyId) -> Result<BasePose>;

    fn reset_base_pose(&mut self, body: BodyId, pose: BasePose) -> Result<()>;

    /// Render an image from the given camera.
    fn render(&mut self, _view: &CameraView) -> Result<Image> {
        Err(BackendError::Unsupported("rendering not supported"))
    }
}
