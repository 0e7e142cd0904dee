//! Simulated TriFinger camera rig.

use crate::{CameraObservation, Result, TriCameraObservation};
use sim_backend::{CameraView, PhysicsBackend};

/// Names of the three cameras, in observation order.
pub const CAMERA_NAMES: [&str; 3] = ["camera60", "camera180", "camera300"];

const IMAGE_SIZE: u32 = 270;
const MOUNT_RADIUS: f64 = 0.3;
const MOUNT_HEIGHT: f64 = 0.3;

/// Three cameras placed around the arena, looking at its centre.
#[derive(Debug, Clone)]
pub struct TriFingerCameras {
    views: [CameraView; 3],
}

impl Default for TriFingerCameras {
    fn default() -> Self {
        Self::new()
    }
}

impl TriFingerCameras {
    pub fn new() -> Self {
        Self {
            views: [60.0, 180.0, 300.0].map(|azimuth_deg: f64| {
                let a = azimuth_deg.to_radians();
                CameraView {
                    name: format!("camera{azimuth_deg}"),
                    eye: [MOUNT_RADIUS * a.cos(), MOUNT_RADIUS * a.sin(), MOUNT_HEIGHT],
                    target: [0.0, 0.0, 0.0],
                    up: [0.0, 0.0, 1.0],
                    fov_deg: 52.0,
                    near: 0.02,
                    far: 2.0,
                    width: IMAGE_SIZE,
                    height: IMAGE_SIZE,
                }
            }),
        }
    }

    pub fn views(&self) -> &[CameraView; 3] {
        &self.views
    }

    /// Render all cameras. Timestamps are left unset.
    pub fn get_images<B: PhysicsBackend>(&self, backend: &mut B) -> Result<TriCameraObservation> {
        let mut observation = TriCameraObservation::default();
        for (slot, view) in observation.cameras.iter_mut().zip(&self.views) {
            *slot = CameraObservation {
                image: Some(backend.render(view)?),
                timestamp: None,
            };
        }
        Ok(observation)
    }
}
