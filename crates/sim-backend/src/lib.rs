//! sim-backend: physics engine abstraction for simulated robots
//!
//! This crate provides the trait and value types a robot wrapper needs from a
//! rigid-body engine: connection lifecycle, model loading, joint state access,
//! torque control, stepping and camera rendering. The default build enables a
//! `mock` backend so that control code compiles and runs on any host without a
//! native engine.

mod types;
pub use types::{
    BasePose, BodyId, BodyInfo, CameraView, ConnectionMode, Image, JointInfo, JointState,
    LoadOptions, PixelFormat, IDENTITY_ORIENTATION,
};

mod error;
pub use error::{BackendError, Result};

mod traits;
pub use traits::PhysicsBackend;

#[cfg(feature = "mock")]
mod mock;

#[cfg(feature = "mock")]
pub use mock::{MockPhysics, ModelSpec};
