use serde::{Deserialize, Serialize};
use sim_backend::{BasePose, Image, IDENTITY_ORIENTATION};

/// Index of a control step. The first appended action yields index 0.
pub type TimeIndex = u64;

/// Desired joint command for one control step.
///
/// `NaN` in `position` disables position control for that joint, `NaN` in a
/// gain selects the default gain of the finger type.
#[derive(Debug, Clone)]
pub struct Action {
    /// Feed-forward torque (Nm)
    pub torque: Vec<f64>,
    /// Joint position targets (rad)
    pub position: Vec<f64>,
    pub position_kp: Vec<f64>,
    pub position_kd: Vec<f64>,
}

impl Action {
    /// Zero torque, no position control, default gains.
    pub fn zero(n_joints: usize) -> Self {
        Self {
            torque: vec![0.0; n_joints],
            position: vec![f64::NAN; n_joints],
            position_kp: vec![f64::NAN; n_joints],
            position_kd: vec![f64::NAN; n_joints],
        }
    }

    pub fn torque(torque: Vec<f64>) -> Self {
        let n = torque.len();
        Self {
            torque,
            ..Self::zero(n)
        }
    }

    pub fn position(position: Vec<f64>) -> Self {
        let n = position.len();
        Self {
            position,
            ..Self::zero(n)
        }
    }

    pub fn with_gains(mut self, kp: Vec<f64>, kd: Vec<f64>) -> Self {
        self.position_kp = kp;
        self.position_kd = kd;
        self
    }

    pub fn with_torque(mut self, torque: Vec<f64>) -> Self {
        self.torque = torque;
        self
    }
}

/// Joint state measured at one step.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RobotObservation {
    pub position: Vec<f64>,
    pub velocity: Vec<f64>,
    pub torque: Vec<f64>,
}

/// Pose of the tracked object.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectPose {
    /// Position (x, y, z) in meters
    pub position: [f64; 3],
    /// Orientation as (x, y, z, w) quaternion
    pub orientation: [f64; 4],
    /// Seconds since the start of the episode; unset until the step is known
    pub timestamp: Option<f64>,
    /// Estimate of the confidence for this observation (0.0 to 1.0)
    pub confidence: f64,
}

impl Default for ObjectPose {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            orientation: IDENTITY_ORIENTATION,
            timestamp: None,
            confidence: 1.0,
        }
    }
}

impl From<BasePose> for ObjectPose {
    fn from(pose: BasePose) -> Self {
        Self {
            position: pose.position,
            orientation: pose.orientation,
            ..Self::default()
        }
    }
}

/// Position and orientation without observation metadata.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: [f64; 3],
    pub orientation: [f64; 4],
}

impl From<&ObjectPose> for Pose {
    fn from(pose: &ObjectPose) -> Self {
        Self {
            position: pose.position,
            orientation: pose.orientation,
        }
    }
}

impl From<Pose> for BasePose {
    fn from(pose: Pose) -> Self {
        BasePose {
            position: pose.position,
            orientation: pose.orientation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CameraObservation {
    pub image: Option<Image>,
    /// Seconds since the start of the episode
    pub timestamp: Option<f64>,
}

/// Observations of "camera60", "camera180" and "camera300", in this order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TriCameraObservation {
    pub cameras: [CameraObservation; 3],
}

impl TriCameraObservation {
    pub fn set_timestamp(&mut self, timestamp: Option<f64>) {
        for camera in &mut self.cameras {
            camera.timestamp = timestamp;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_action() {
        let action = Action::zero(9);
        assert_eq!(action.torque, vec![0.0; 9]);
        assert!(action.position.iter().all(|p| p.is_nan()));
        assert!(action.position_kp.iter().all(|p| p.is_nan()));
        assert!(action.position_kd.iter().all(|p| p.is_nan()));
    }

    #[test]
    fn test_position_action_keeps_zero_torque() {
        let action = Action::position(vec![0.1, 0.2, 0.3]).with_gains(vec![1.0; 3], vec![0.1; 3]);
        assert_eq!(action.torque, vec![0.0; 3]);
        assert_eq!(action.position, vec![0.1, 0.2, 0.3]);
        assert_eq!(action.position_kd, vec![0.1; 3]);
    }

    #[test]
    fn test_object_pose_default() {
        let pose = ObjectPose::default();
        assert_eq!(pose.confidence, 1.0);
        assert_eq!(pose.timestamp, None);
        assert_eq!(pose.orientation, [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_tri_camera_timestamp() {
        let mut obs = TriCameraObservation::default();
        obs.set_timestamp(Some(0.5));
        assert!(obs.cameras.iter().all(|c| c.timestamp == Some(0.5)));
    }
}
