//! trifinger-sim: simulated TriFinger robot platform
//!
//! This crate wraps a physics backend so that it behaves like the frontend of
//! the real TriFinger platform: actions are appended step by step, each call
//! returns a time index, and robot, object and camera observations are
//! queried by that index. Episodes can be recorded to a JSON action log.
//!
//! The default build enables the `mock` backend so that the whole loop runs
//! without a native physics engine.

mod types;
pub use types::{
    Action, CameraObservation, ObjectPose, Pose, RobotObservation, TimeIndex,
    TriCameraObservation,
};

mod error;
pub use error::{Error, Result};

pub mod finger_types;
pub use finger_types::{check_finger_type, get_valid_finger_types, FingerType, FingerTypeCheck};

pub mod assets;

pub mod connector;
pub use connector::{ConnectorOptions, KinematicsConfig, LinkIndex, RobotConnector};

pub mod sim_finger;
pub use sim_finger::SimFinger;

pub mod observation;

pub mod objects;

pub mod camera;

pub mod action_log;
pub use action_log::{ActionLog, ActionRecord};

mod config;
pub use config::{load_config_file, PlatformConfig};

pub mod platform;
pub use platform::TriFingerPlatform;

#[cfg(feature = "mock")]
pub mod mock;
