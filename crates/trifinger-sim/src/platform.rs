//! Simulated TriFinger platform with the interface of the robot frontend.
//!
//! The platform combines the robot with the manipulated cube and the camera
//! rig. Object pose and camera images are sampled right before each step,
//! so the observation for step `t` is the state the action of step `t` was
//! applied to. Their timestamps can only be set once `t` is known, i.e. after
//! the step.
//!
//! `get_robot_status()` and `wait_until_timeindex()` of the hardware frontend
//! have no simulated counterpart.

use crate::action_log::ActionLog;
use crate::assets::resolve_asset_root;
use crate::camera::TriFingerCameras;
use crate::config::PlatformConfig;
use crate::connector::{ConnectorOptions, RobotConnector};
use crate::objects::{sample_initial_pose, Block};
use crate::observation::{Lookup, ObservationCache};
use crate::sim_finger::SimFinger;
use crate::{
    Action, Error, ObjectPose, Pose, Result, RobotObservation, TimeIndex, TriCameraObservation,
};
use rand::Rng;
use sim_backend::PhysicsBackend;
use std::path::Path;

/// Robot used by the platform.
pub const PLATFORM_FINGER_TYPE: &str = "trifingerpro";

/// Joint positions where the fingers cannot collide with an object lying on
/// the floor.
pub fn initial_robot_position() -> Vec<f64> {
    [0.0, -70f64.to_radians(), -130f64.to_radians()].repeat(3)
}

pub struct TriFingerPlatform<B: PhysicsBackend> {
    simfinger: SimFinger<B>,
    cube: Block,
    tricamera: TriFingerCameras,
    cache: ObservationCache,
    action_log: ActionLog,
    config: PlatformConfig,
}

impl<B: PhysicsBackend> TriFingerPlatform<B> {
    /// Set up the platform; the initial cube pose is sampled randomly if the
    /// config has none.
    pub fn new(backend: B, config: PlatformConfig) -> Result<Self> {
        Self::with_rng(backend, config, &mut rand::thread_rng())
    }

    pub fn with_rng<R: Rng>(backend: B, config: PlatformConfig, rng: &mut R) -> Result<Self> {
        let assets = resolve_asset_root(config.asset_root.as_deref());
        let options = ConnectorOptions {
            enable_visualization: config.visualization,
            ..ConnectorOptions::new(PLATFORM_FINGER_TYPE)
        };
        let connector = RobotConnector::new(backend, &options, &assets)?;
        let mut simfinger = SimFinger::new(connector, config.time_step_s)?;

        let initial_position = initial_robot_position();
        simfinger.reset_finger_positions_and_velocities(&initial_position, None)?;

        let initial_pose = config
            .initial_object_pose
            .unwrap_or_else(|| sample_initial_pose(rng));
        let cube = Block::new(
            simfinger.connector_mut().backend_mut(),
            &assets,
            initial_pose,
        )?;

        tracing::info!(
            cameras = config.enable_cameras,
            time_step_s = config.time_step_s,
            object_position = ?initial_pose.position,
            "TriFinger platform ready"
        );
        Ok(Self {
            simfinger,
            cube,
            tricamera: TriFingerCameras::new(),
            cache: ObservationCache::Empty,
            action_log: ActionLog::new(initial_position, initial_pose),
            config,
        })
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    /// Vestigial: observations are updated in every step.
    pub fn camera_rate_fps(&self) -> f64 {
        self.config.camera_rate_fps
    }

    pub fn cameras_enabled(&self) -> bool {
        self.config.enable_cameras
    }

    /// Simulation time step in seconds.
    pub fn get_time_step(&self) -> f64 {
        self.simfinger.time_step_s()
    }

    pub fn number_of_joints(&self) -> usize {
        self.simfinger.number_of_joints()
    }

    /// Zero torque, no position control, default gains.
    pub fn zero_action(&self) -> Action {
        self.simfinger.zero_action()
    }

    /// Apply `action` for one step and record it in the action log.
    pub fn append_desired_action(&mut self, action: &Action) -> Result<TimeIndex> {
        let mut pose = self.current_object_pose(None)?;
        let mut cameras = if self.config.enable_cameras {
            Some(self.current_camera_observation(None)?)
        } else {
            None
        };

        let t = self.simfinger.append_desired_action(action)?;

        // the timestamp is only known now that t is given
        let timestamp_s = Some(self.simfinger.get_timestamp_ms(t)? / 1000.0);
        pose.timestamp = timestamp_s;
        if let Some(cameras) = cameras.as_mut() {
            cameras.set_timestamp(timestamp_s);
        }
        self.cache.store(t, pose, cameras);
        self.action_log.append(t, action);
        Ok(t)
    }

    /// Object pose at step `t`, which has to be the current or the next step.
    ///
    /// Poses come directly from the simulation, so the confidence is 1.0.
    pub fn get_object_pose(&self, t: TimeIndex) -> Result<ObjectPose> {
        match self.cache.object_pose(t)? {
            Lookup::Cached(pose) => Ok(pose.clone()),
            Lookup::Fresh => self.current_object_pose(Some(t)),
        }
    }

    /// Images of the three cameras at step `t`, which has to be the current
    /// or the next step.
    pub fn get_camera_observation(&mut self, t: TimeIndex) -> Result<TriCameraObservation> {
        if !self.config.enable_cameras {
            return Err(Error::CamerasDisabled);
        }
        match self.cache.cameras(t)? {
            Lookup::Cached(observation) => Ok(observation.clone()),
            Lookup::Fresh => self.current_camera_observation(Some(t)),
        }
    }

    pub fn get_desired_action(&self, t: TimeIndex) -> Result<&Action> {
        self.simfinger.get_desired_action(t)
    }

    pub fn get_applied_action(&self, t: TimeIndex) -> Result<&Action> {
        self.simfinger.get_applied_action(t)
    }

    pub fn get_timestamp_ms(&self, t: TimeIndex) -> Result<f64> {
        self.simfinger.get_timestamp_ms(t)
    }

    pub fn get_current_timeindex(&self) -> Option<TimeIndex> {
        self.simfinger.get_current_timeindex()
    }

    pub fn get_robot_observation(&self, t: TimeIndex) -> Result<RobotObservation> {
        self.simfinger.get_observation(t)
    }

    pub fn action_log(&self) -> &ActionLog {
        &self.action_log
    }

    pub fn simfinger(&self) -> &SimFinger<B> {
        &self.simfinger
    }

    /// Record the final object pose and write the log as JSON to `path`,
    /// replacing an existing file.
    pub fn store_action_log(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let final_pose = match self.get_current_timeindex() {
            Some(t) => self.get_object_pose(t)?,
            None => self.current_object_pose(None)?,
        };
        self.action_log.set_final_object_pose(Pose::from(&final_pose));
        self.action_log.store(path)
    }

    fn timestamp_s(&self, t: Option<TimeIndex>) -> Result<Option<f64>> {
        t.map(|t| self.simfinger.get_timestamp_ms(t).map(|ms| ms / 1000.0))
            .transpose()
    }

    fn current_object_pose(&self, t: Option<TimeIndex>) -> Result<ObjectPose> {
        let state = self.cube.get_state(self.simfinger.connector().backend())?;
        Ok(ObjectPose {
            timestamp: self.timestamp_s(t)?,
            confidence: 1.0,
            ..ObjectPose::from(state)
        })
    }

    fn current_camera_observation(&mut self, t: Option<TimeIndex>) -> Result<TriCameraObservation> {
        let timestamp = self.timestamp_s(t)?;
        let mut observation = self
            .tricamera
            .get_images(self.simfinger.connector_mut().backend_mut())?;
        observation.set_timestamp(timestamp);
        Ok(observation)
    }
}

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;
    use crate::mock::mock_backend;
    use crate::objects::CUBE_WIDTH;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use sim_backend::MockPhysics;
    use std::path::PathBuf;

    fn config(enable_cameras: bool) -> PlatformConfig {
        PlatformConfig {
            enable_cameras,
            asset_root: Some(PathBuf::from("/assets")),
            initial_object_pose: Some(Pose {
                position: [0.02, 0.03, CUBE_WIDTH / 2.0],
                orientation: [0.0, 0.0, 0.0, 1.0],
            }),
            ..PlatformConfig::default()
        }
    }

    fn platform(enable_cameras: bool) -> TriFingerPlatform<MockPhysics> {
        let config = config(enable_cameras);
        let assets = resolve_asset_root(config.asset_root.as_deref());
        TriFingerPlatform::new(mock_backend(&assets), config).unwrap()
    }

    #[test]
    fn test_first_step_and_pose() {
        let mut platform = platform(false);
        let action = Action::torque(vec![0.1, -0.1, 0.05].repeat(3));
        let t = platform.append_desired_action(&action).unwrap();
        assert_eq!(t, 0);
        let pose = platform.get_object_pose(t).unwrap();
        assert_eq!(pose.confidence, 1.0);
        assert_eq!(pose.position, [0.02, 0.03, CUBE_WIDTH / 2.0]);
        assert_eq!(pose.timestamp, Some(0.0));
    }

    #[test]
    fn test_pose_index_validity() {
        let mut platform = platform(false);
        assert!(platform.get_object_pose(0).is_err());
        let action = platform.zero_action();
        for _ in 0..3 {
            platform.append_desired_action(&action).unwrap();
        }
        let current = platform.get_current_timeindex().unwrap();
        assert_eq!(current, 2);
        assert!(platform.get_object_pose(current).is_ok());
        let next = platform.get_object_pose(current + 1).unwrap();
        assert!((next.timestamp.unwrap() - 0.012).abs() < 1e-12);
        assert!(matches!(
            platform.get_object_pose(current - 1),
            Err(Error::InvalidTimeIndex { requested: 1, current: Some(2) })
        ));
        assert!(matches!(
            platform.get_object_pose(current + 2),
            Err(Error::InvalidTimeIndex { .. })
        ));
    }

    #[test]
    fn test_time_index_monotonic() {
        let mut platform = platform(false);
        let action = platform.zero_action();
        let mut last = platform.append_desired_action(&action).unwrap();
        for _ in 0..10 {
            let t = platform.append_desired_action(&action).unwrap();
            assert_eq!(t, last + 1);
            last = t;
        }
    }

    #[test]
    fn test_cameras_disabled() {
        let mut platform = platform(false);
        assert!(matches!(
            platform.get_camera_observation(0),
            Err(Error::CamerasDisabled)
        ));
        let action = platform.zero_action();
        let t = platform.append_desired_action(&action).unwrap();
        for requested in [t, t + 1, t + 5] {
            assert!(matches!(
                platform.get_camera_observation(requested),
                Err(Error::CamerasDisabled)
            ));
        }
    }

    #[test]
    fn test_camera_observation_timestamps() {
        let mut platform = platform(true);
        let action = platform.zero_action();
        platform.append_desired_action(&action).unwrap();
        let t = platform.append_desired_action(&action).unwrap();

        let cached = platform.get_camera_observation(t).unwrap();
        for camera in &cached.cameras {
            assert!(camera.image.is_some());
            assert!((camera.timestamp.unwrap() - 0.004).abs() < 1e-12);
        }
        let fresh = platform.get_camera_observation(t + 1).unwrap();
        assert!((fresh.cameras[2].timestamp.unwrap() - 0.008).abs() < 1e-12);
        assert!(platform.get_camera_observation(t + 2).is_err());
    }

    #[test]
    fn test_pose_sampled_before_step() {
        let mut platform = platform(false);
        let action = platform.zero_action();
        let t = platform.append_desired_action(&action).unwrap();
        let cube = platform.cube;
        let moved = Pose {
            position: [-0.05, 0.0, CUBE_WIDTH / 2.0],
            orientation: [0.0, 0.0, 0.0, 1.0],
        };
        cube.set_state(platform.simfinger.connector_mut().backend_mut(), moved)
            .unwrap();
        assert_eq!(
            platform.get_object_pose(t).unwrap().position,
            [0.02, 0.03, CUBE_WIDTH / 2.0]
        );
        assert_eq!(platform.get_object_pose(t + 1).unwrap().position, moved.position);
    }

    #[test]
    fn test_action_log_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("action_log.json");
        let mut platform = platform(false);

        let actions: Vec<Action> = (0..5)
            .map(|i| Action::torque(vec![0.01 * i as f64; 9]))
            .collect();
        for action in &actions {
            platform.append_desired_action(action).unwrap();
        }
        platform.store_action_log(&path).unwrap();

        let log = ActionLog::load(&path).unwrap();
        assert_eq!(log.actions.len(), actions.len());
        for (i, (record, action)) in log.actions.iter().zip(&actions).enumerate() {
            assert_eq!(record.t, i as u64);
            assert_eq!(record.torque, action.torque);
            assert!(record.position.iter().all(|p| p.is_nan()));
        }
        assert_eq!(log.initial_robot_position, initial_robot_position());
        assert_eq!(
            log.final_object_pose.map(|p| p.position),
            Some([0.02, 0.03, CUBE_WIDTH / 2.0])
        );
    }

    #[test]
    fn test_store_before_any_action() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");
        let mut platform = platform(false);
        platform.store_action_log(&path).unwrap();
        let log = ActionLog::load(&path).unwrap();
        assert!(log.is_empty());
        assert!(log.final_object_pose.is_some());
    }

    #[test]
    fn test_robot_starts_in_initial_position() {
        let mut platform = platform(false);
        let action = platform.zero_action();
        let t = platform.append_desired_action(&action).unwrap();
        let obs = platform.get_robot_observation(t).unwrap();
        for (q, q0) in obs.position.iter().zip(initial_robot_position()) {
            assert!((q - q0).abs() < 1e-12);
        }
        assert_eq!(platform.get_desired_action(t).unwrap().torque, vec![0.0; 9]);
        assert!(platform.get_applied_action(t).is_ok());
    }

    #[test]
    fn test_random_initial_pose_on_floor() {
        let config = PlatformConfig {
            initial_object_pose: None,
            ..config(false)
        };
        let assets = resolve_asset_root(config.asset_root.as_deref());
        let mut rng = StdRng::seed_from_u64(3);
        let platform =
            TriFingerPlatform::with_rng(mock_backend(&assets), config, &mut rng).unwrap();
        let pose = platform.action_log().initial_object_pose;
        assert_eq!(pose.position[2], CUBE_WIDTH / 2.0);
    }

    #[test]
    fn test_platform_uses_trifingerpro() {
        let platform = platform(false);
        assert_eq!(platform.number_of_joints(), 9);
        assert_eq!(platform.get_time_step(), 0.004);
        assert_eq!(platform.camera_rate_fps(), 30.0);
        assert!(platform
            .simfinger()
            .connector()
            .urdf_path()
            .ends_with("pro/trifingerpro.urdf"));
    }
}
