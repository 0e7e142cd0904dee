//! In-process mock engine for development and testing

use crate::{
    BackendError, BasePose, BodyId, BodyInfo, CameraView, ConnectionMode, Image, JointInfo,
    JointState, LoadOptions, PhysicsBackend, PixelFormat, Result,
};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Structure of a model that the mock loader can instantiate.
#[derive(Clone, Debug, Default)]
pub struct ModelSpec {
    pub body_name: String,
    pub base_link_name: String,
    /// (joint name, child link name) in joint index order.
    pub joints: Vec<(String, String)>,
}

impl ModelSpec {
    pub fn new(body_name: impl Into<String>, base_link_name: impl Into<String>) -> Self {
        Self {
            body_name: body_name.into(),
            base_link_name: base_link_name.into(),
            joints: Vec::new(),
        }
    }

    pub fn joint(mut self, joint_name: impl Into<String>, link_name: impl Into<String>) -> Self {
        self.joints.push((joint_name.into(), link_name.into()));
        self
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct MockJoint {
    position: f64,
    velocity: f64,
    commanded: f64,
    applied: f64,
}

#[derive(Debug)]
struct MockBody {
    spec: ModelSpec,
    base: BasePose,
    joints: Vec<MockJoint>,
}

/// A deterministic physics server living in the current process.
///
/// Every joint is a damped rotor with unit-free inertia; free bodies keep
/// whatever base pose they were given. Models have to be registered under
/// the path they will be loaded from.
pub struct MockPhysics {
    mode: Option<ConnectionMode>,
    models: HashMap<PathBuf, ModelSpec>,
    bodies: BTreeMap<BodyId, MockBody>,
    next_body: u32,
    time_step: f64,
    joint_inertia: f64,
    joint_damping: f64,
    steps: u64,
    frames: u64,
}

impl Default for MockPhysics {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPhysics {
    pub fn new() -> Self {
        Self {
            mode: None,
            models: HashMap::new(),
            bodies: BTreeMap::new(),
            next_body: 0,
            time_step: 1.0 / 240.0,
            joint_inertia: 0.01,
            joint_damping: 0.01,
            steps: 0,
            frames: 0,
        }
    }

    /// Make `path` loadable.
    pub fn register_model(&mut self, path: impl Into<PathBuf>, spec: ModelSpec) {
        self.models.insert(path.into(), spec);
    }

    pub fn with_model(mut self, path: impl Into<PathBuf>, spec: ModelSpec) -> Self {
        self.register_model(path, spec);
        self
    }

    pub fn connection_mode(&self) -> Option<ConnectionMode> {
        self.mode
    }

    /// Number of steps simulated since construction.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.mode.is_some() {
            Ok(())
        } else {
            Err(BackendError::NotConnected)
        }
    }

    fn body(&self, body: BodyId) -> Result<&MockBody> {
        self.ensure_connected()?;
        self.bodies.get(&body).ok_or(BackendError::UnknownBody(body))
    }

    fn body_mut(&mut self, body: BodyId) -> Result<&mut MockBody> {
        self.ensure_connected()?;
        self.bodies
            .get_mut(&body)
            .ok_or(BackendError::UnknownBody(body))
    }
}

fn check_joint(body: BodyId, b: &MockBody, joint: usize) -> Result<()> {
    if joint < b.joints.len() {
        Ok(())
    } else {
        Err(BackendError::JointOutOfRange {
            body,
            index: joint,
            count: b.joints.len(),
        })
    }
}

impl PhysicsBackend for MockPhysics {
    fn connect(&mut self, mode: ConnectionMode) -> Result<()> {
        if self.mode.is_some() {
            return Err(BackendError::AlreadyConnected);
        }
        tracing::debug!(?mode, "mock physics connected");
        self.mode = Some(mode);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.mode.is_some()
    }

    fn disconnect(&mut self) -> Result<()> {
        self.ensure_connected()?;
        self.mode = None;
        self.bodies.clear();
        tracing::debug!("mock physics disconnected");
        Ok(())
    }

    fn set_time_step(&mut self, dt: f64) -> Result<()> {
        self.ensure_connected()?;
        self.time_step = dt;
        Ok(())
    }

    fn load_model(&mut self, path: &Path, base: BasePose, options: LoadOptions) -> Result<BodyId> {
        self.ensure_connected()?;
        let spec = self
            .models
            .get(path)
            .cloned()
            .ok_or_else(|| BackendError::ModelNotFound(path.to_path_buf()))?;
        let id = BodyId(self.next_body);
        self.next_body += 1;
        tracing::debug!(
            body = %id,
            path = %path.display(),
            fixed_base = options.use_fixed_base,
            "mock physics loaded model"
        );
        let joints = vec![MockJoint::default(); spec.joints.len()];
        self.bodies.insert(id, MockBody { spec, base, joints });
        Ok(id)
    }

    fn body_info(&self, body: BodyId) -> Result<BodyInfo> {
        let b = self.body(body)?;
        Ok(BodyInfo {
            base_link_name: b.spec.base_link_name.clone(),
            body_name: b.spec.body_name.clone(),
        })
    }

    fn num_joints(&self, body: BodyId) -> Result<usize> {
        Ok(self.body(body)?.joints.len())
    }

    fn joint_info(&self, body: BodyId, joint: usize) -> Result<JointInfo> {
        let b = self.body(body)?;
        check_joint(body, b, joint)?;
        let (joint_name, link_name) = b.spec.joints[joint].clone();
        Ok(JointInfo {
            index: joint,
            joint_name,
            link_name,
        })
    }

    fn reset_joint_state(
        &mut self,
        body: BodyId,
        joint: usize,
        position: f64,
        velocity: f64,
    ) -> Result<()> {
        let b = self.body_mut(body)?;
        check_joint(body, b, joint)?;
        let j = &mut b.joints[joint];
        j.position = position;
        j.velocity = velocity;
        Ok(())
    }

    fn joint_states(&self, body: BodyId, joints: &[usize]) -> Result<Vec<JointState>> {
        let b = self.body(body)?;
        joints
            .iter()
            .map(|&i| {
                check_joint(body, b, i)?;
                let j = &b.joints[i];
                Ok(JointState {
                    position: j.position,
                    velocity: j.velocity,
                    motor_torque: j.applied,
                })
            })
            .collect()
    }

    fn set_joint_torques(
        &mut self,
        body: BodyId,
        joints: &[usize],
        torques: &[f64],
    ) -> Result<()> {
        if joints.len() != torques.len() {
            return Err(BackendError::LengthMismatch {
                expected: joints.len(),
                got: torques.len(),
            });
        }
        let b = self.body_mut(body)?;
        for (&i, &tau) in joints.iter().zip(torques) {
            check_joint(body, b, i)?;
            b.joints[i].commanded = tau;
        }
        Ok(())
    }

    fn step_simulation(&mut self) -> Result<()> {
        self.ensure_connected()?;
        let dt = self.time_step;
        let (inertia, damping) = (self.joint_inertia, self.joint_damping);
        for b in self.bodies.values_mut() {
            for j in &mut b.joints {
                // Semi-implicit Euler keeps the rotor stable for stiff PD gains
                let acc = (j.commanded - damping * j.velocity) / inertia;
                j.velocity += acc * dt;
                j.position += j.velocity * dt;
                j.applied = j.commanded;
            }
        }
        self.steps += 1;
        Ok(())
    }

    fn base_pose(&self, body: BodyId) -> Result<BasePose> {
        Ok(self.body(body)?.base)
    }

    fn reset_base_pose(&mut self, body: BodyId, pose: BasePose) -> Result<()> {
        self.body_mut(body)?.base = pose;
        Ok(())
    }

    fn render(&mut self, view: &CameraView) -> Result<Image> {
        self.ensure_connected()?;
        self.frames += 1;
        let (width, height) = (view.width, view.height);
        let shift = (self.frames % 256) as u32;
        let mut data = Vec::with_capacity(buffer_len(width, height, PixelFormat::Rgb8));
        for y in 0..height {
            for x in 0..width {
                data.push(((x + shift) % 256) as u8);
                data.push(((y + shift) % 256) as u8);
                data.push(((x + y) % 256) as u8);
            }
        }
        Ok(Image {
            width,
            height,
            pixel_format: PixelFormat::Rgb8,
            data,
        })
    }
}

fn buffer_len(width: u32, height: u32, format: PixelFormat) -> usize {
    width as usize * height as usize * format.channels()
}
