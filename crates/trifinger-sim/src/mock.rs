//! Finger and cube models for the in-process mock backend.

use crate::assets::AssetRoot;
use crate::FingerType;
use sim_backend::{MockPhysics, ModelSpec};

/// Describe `finger_type` the way its URDF does: per finger the three
/// actuated links followed by the fixed fingertip link.
pub fn finger_model(finger_type: FingerType) -> ModelSpec {
    let topology = finger_type.topology();
    let mut spec = ModelSpec::new(finger_type.name(), "base_link");
    let actuated = topology.link_names.chunks(3);
    for (links, tip) in actuated.zip(&topology.tip_link_names) {
        for link in links {
            spec = spec.joint(format!("{link}_joint"), link.clone());
        }
        spec = spec.joint(format!("{tip}_joint"), tip.clone());
    }
    spec
}

pub fn cube_model() -> ModelSpec {
    ModelSpec::new("cube", "cube")
}

/// Register every finger type and the cube under their paths in `assets`.
pub fn register_finger_models(sim: &mut MockPhysics, assets: &AssetRoot) {
    for finger_type in FingerType::ALL {
        sim.register_model(assets.urdf_path(finger_type), finger_model(finger_type));
    }
    sim.register_model(assets.cube_urdf_path(), cube_model());
}

/// A mock backend that can load everything the platform needs.
pub fn mock_backend(assets: &AssetRoot) -> MockPhysics {
    let mut sim = MockPhysics::new();
    register_finger_models(&mut sim, assets);
    sim
}
