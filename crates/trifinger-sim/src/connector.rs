//! Connection lifecycle and model loading for the finger robots.

use crate::assets::AssetRoot;
use crate::finger_types::{check_finger_type, warn_deprecated, FingerType, JointTopology};
use crate::{Error, Result};
use sim_backend::{BasePose, BodyId, ConnectionMode, LoadOptions, PhysicsBackend};
use std::collections::HashMap;
use std::path::PathBuf;

/// Index of a link as assigned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkIndex {
    /// Root link of the body.
    Base,
    /// Child link of the joint with the same index.
    Joint(usize),
}

impl LinkIndex {
    pub fn joint(self) -> Option<usize> {
        match self {
            LinkIndex::Base => None,
            LinkIndex::Joint(i) => Some(i),
        }
    }
}

/// Backend handles of the loaded robot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedRobot {
    pub body: BodyId,
    pub link_indices: Vec<LinkIndex>,
    pub tip_link_indices: Vec<LinkIndex>,
    /// Joint and link indices coincide for the actuated links.
    pub joint_indices: Vec<usize>,
}

/// Inputs for an external forward/inverse kinematics solver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KinematicsConfig {
    pub urdf_path: PathBuf,
    pub tip_link_names: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ConnectorOptions {
    pub finger_type: String,
    pub enable_visualization: bool,
    /// When false, no connection is made and nothing is loaded; only the
    /// finger type data is available.
    pub enable_simulation: bool,
}

impl ConnectorOptions {
    pub fn new(finger_type: impl Into<String>) -> Self {
        Self {
            finger_type: finger_type.into(),
            enable_visualization: false,
            enable_simulation: true,
        }
    }
}

/// Owns the backend connection of one finger robot.
///
/// The connection is released on [`RobotConnector::disconnect`] or when the
/// connector is dropped, whichever comes first.
pub struct RobotConnector<B: PhysicsBackend> {
    backend: B,
    finger_type: FingerType,
    topology: JointTopology,
    urdf_path: PathBuf,
    enable_visualization: bool,
    enable_simulation: bool,
    robot: Option<LoadedRobot>,
}

impl<B: PhysicsBackend> RobotConnector<B> {
    pub fn new(backend: B, options: &ConnectorOptions, assets: &AssetRoot) -> Result<Self> {
        let check = check_finger_type(&options.finger_type)?;
        if let Some(alias) = check.deprecated_alias {
            warn_deprecated(alias);
        }
        let finger_type = check.finger_type;
        let mut connector = Self {
            backend,
            finger_type,
            topology: finger_type.topology(),
            urdf_path: assets.urdf_path(finger_type),
            enable_visualization: options.enable_visualization,
            enable_simulation: options.enable_simulation,
            robot: None,
        };
        if connector.enable_simulation {
            connector.connect()?;
            connector.load_robot()?;
        }
        Ok(connector)
    }

    fn connect(&mut self) -> Result<()> {
        let mode = if self.enable_visualization {
            ConnectionMode::Gui
        } else {
            ConnectionMode::Headless
        };
        self.backend.connect(mode)?;
        tracing::info!(?mode, finger_type = %self.finger_type, "connected to physics backend");
        Ok(())
    }

    fn load_robot(&mut self) -> Result<()> {
        let options = LoadOptions {
            use_fixed_base: true,
            inertia_from_file: true,
            self_collision: true,
        };
        let body = self
            .backend
            .load_model(&self.urdf_path, BasePose::default(), options)?;

        let mut name_to_index = HashMap::new();
        name_to_index.insert(self.backend.body_info(body)?.base_link_name, LinkIndex::Base);
        for joint in 0..self.backend.num_joints(body)? {
            let info = self.backend.joint_info(body, joint)?;
            name_to_index.insert(info.link_name, LinkIndex::Joint(joint));
        }

        let lookup = |names: &[String]| -> Result<Vec<LinkIndex>> {
            names
                .iter()
                .map(|name| {
                    name_to_index
                        .get(name)
                        .copied()
                        .ok_or_else(|| Error::UnknownLinkName(name.clone()))
                })
                .collect()
        };
        let link_indices = lookup(self.topology.link_names.as_slice())?;
        let tip_link_indices = lookup(self.topology.tip_link_names.as_slice())?;
        let joint_indices = link_indices
            .iter()
            .zip(&self.topology.link_names)
            .map(|(idx, name)| idx.joint().ok_or_else(|| Error::UnknownLinkName(name.clone())))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            body = %body,
            path = %self.urdf_path.display(),
            joints = joint_indices.len(),
            "robot model loaded"
        );
        self.robot = Some(LoadedRobot {
            body,
            link_indices,
            tip_link_indices,
            joint_indices,
        });
        Ok(())
    }

    /// Release the backend connection. Calling this again is a no-op.
    pub fn disconnect(&mut self) -> Result<()> {
        if !self.enable_simulation {
            return Ok(());
        }
        self.enable_simulation = false;
        self.robot = None;
        if self.backend.is_connected() {
            self.backend.disconnect()?;
            tracing::info!(finger_type = %self.finger_type, "disconnected from physics backend");
        }
        Ok(())
    }

    pub fn is_simulation_enabled(&self) -> bool {
        self.enable_simulation
    }

    pub fn finger_type(&self) -> FingerType {
        self.finger_type
    }

    pub fn topology(&self) -> &JointTopology {
        &self.topology
    }

    pub fn urdf_path(&self) -> &std::path::Path {
        &self.urdf_path
    }

    /// Handles of the loaded robot, `None` while the simulation is disabled.
    pub fn robot(&self) -> Option<&LoadedRobot> {
        self.robot.as_ref()
    }

    pub fn kinematics(&self) -> KinematicsConfig {
        KinematicsConfig {
            urdf_path: self.urdf_path.clone(),
            tip_link_names: self.topology.tip_link_names.clone(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

impl<B: PhysicsBackend> Drop for RobotConnector<B> {
    fn drop(&mut self) {
        if let Err(e) = self.disconnect() {
            tracing::warn!(error = %e, "failed to disconnect from physics backend");
        }
    }
}

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;
    use crate::assets::{resolve_asset_root, AssetRoot};
    use crate::mock::mock_backend;
    use sim_backend::{MockPhysics, ModelSpec};
    use std::path::Path;

    fn assets() -> AssetRoot {
        resolve_asset_root(Some(Path::new("/assets")))
    }

    fn backend() -> MockPhysics {
        mock_backend(&assets())
    }

    #[test]
    fn test_connect_and_map_links() {
        let connector =
            RobotConnector::new(backend(), &ConnectorOptions::new("trifingerpro"), &assets())
                .unwrap();
        assert!(connector.is_simulation_enabled());
        assert!(connector.backend().is_connected());
        let robot = connector.robot().unwrap();
        assert_eq!(robot.joint_indices.len(), 9);
        assert_eq!(robot.tip_link_indices.len(), 3);
        assert!(robot
            .link_indices
            .iter()
            .all(|l| matches!(l, LinkIndex::Joint(_))));
    }

    #[test]
    fn test_visualization_selects_gui() {
        let mut options = ConnectorOptions::new("fingerone");
        options.enable_visualization = true;
        let connector = RobotConnector::new(backend(), &options, &assets()).unwrap();
        assert_eq!(
            connector.backend().connection_mode(),
            Some(ConnectionMode::Gui)
        );
        assert_eq!(connector.robot().unwrap().joint_indices.len(), 3);
    }

    #[test]
    fn test_disconnect_twice() {
        let mut connector =
            RobotConnector::new(backend(), &ConnectorOptions::new("trifingerone"), &assets())
                .unwrap();
        connector.disconnect().unwrap();
        assert!(!connector.is_simulation_enabled());
        assert!(!connector.backend().is_connected());
        connector.disconnect().unwrap();
        assert!(!connector.is_simulation_enabled());
        assert!(connector.robot().is_none());
    }

    #[test]
    fn test_simulation_disabled_skips_connection() {
        let mut options = ConnectorOptions::new("trifingerpro");
        options.enable_simulation = false;
        // No models registered: loading would fail if it were attempted.
        let connector = RobotConnector::new(MockPhysics::new(), &options, &assets()).unwrap();
        assert!(!connector.backend().is_connected());
        assert!(connector.robot().is_none());
        assert_eq!(connector.topology().link_names.len(), 9);
    }

    #[test]
    fn test_deprecated_type_uses_legacy_topology() {
        let connector =
            RobotConnector::new(backend(), &ConnectorOptions::new("tri"), &assets()).unwrap();
        assert_eq!(connector.finger_type(), FingerType::TriFingerOne);
        assert_eq!(connector.topology().link_names.len(), 9);
        assert_eq!(connector.topology().tip_link_names.len(), 3);
    }

    #[test]
    fn test_tri_alias_warns_once_per_process() {
        for _ in 0..2 {
            let connector =
                RobotConnector::new(backend(), &ConnectorOptions::new("tri"), &assets()).unwrap();
            assert_eq!(connector.topology().link_names.len(), 9);
            assert_eq!(connector.topology().tip_link_names.len(), 3);
        }
        // both connectors went through the process-wide warning already
        assert!(!warn_deprecated("tri"));
    }

    #[test]
    fn test_unknown_finger_type() {
        let result =
            RobotConnector::new(backend(), &ConnectorOptions::new("hexfinger"), &assets());
        assert!(matches!(result, Err(Error::UnknownFingerType(_))));
    }

    #[test]
    fn test_unknown_link_name() {
        let root = assets();
        let sim = MockPhysics::new().with_model(
            root.urdf_path(FingerType::FingerOne),
            ModelSpec::new("finger", "base_link")
                .joint("finger_base_to_upper_joint", "finger_upper_link")
                .joint("finger_upper_to_middle_joint", "finger_middle_link"),
        );
        let result = RobotConnector::new(sim, &ConnectorOptions::new("fingerone"), &root);
        assert!(matches!(result, Err(Error::UnknownLinkName(name)) if name == "finger_lower_link"));
    }

    #[test]
    fn test_missing_model_file() {
        let result =
            RobotConnector::new(MockPhysics::new(), &ConnectorOptions::new("fingerpro"), &assets());
        assert!(matches!(
            result,
            Err(Error::Backend(sim_backend::BackendError::ModelNotFound(_)))
        ));
    }

    #[test]
    fn test_kinematics_config() {
        let connector =
            RobotConnector::new(backend(), &ConnectorOptions::new("fingerpro"), &assets())
                .unwrap();
        let kin = connector.kinematics();
        assert_eq!(kin.urdf_path, Path::new("/assets/urdf/pro/fingerpro.urdf"));
        assert_eq!(kin.tip_link_names, vec!["finger_tip_link".to_string()]);
    }
}
