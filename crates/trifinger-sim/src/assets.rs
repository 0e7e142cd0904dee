//! Locating the robot description package.

use crate::FingerType;
use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Name of the package holding the finger URDFs and meshes.
pub const PACKAGE_NAME: &str = "robot_properties_fingers";

/// Environment variable listing package search directories.
pub const PACKAGE_PATH_VAR: &str = "ROS_PACKAGE_PATH";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetSource {
    /// Path given explicitly by the caller.
    Override,
    /// Found through the package registry.
    PackageRegistry,
    /// Copy shipped next to this crate.
    LocalCopy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRoot {
    pub path: PathBuf,
    pub source: AssetSource,
}

impl AssetRoot {
    pub fn urdf_path(&self, finger_type: FingerType) -> PathBuf {
        self.path.join("urdf").join(finger_type.urdf_file())
    }

    /// Description of the manipulated cube.
    pub fn cube_urdf_path(&self) -> PathBuf {
        self.path.join("urdf").join("cube").join("cube.urdf")
    }
}

/// Search a `PATH`-style list of directories for package `name`.
pub fn find_package_in(search_path: &OsStr, name: &str) -> Option<PathBuf> {
    env::split_paths(search_path).find_map(|dir| {
        if dir.file_name() == Some(OsStr::new(name)) && dir.is_dir() {
            return Some(dir);
        }
        let candidate = dir.join(name);
        candidate.is_dir().then_some(candidate)
    })
}

/// Look up `name` in the package registry.
pub fn find_package(name: &str) -> Option<PathBuf> {
    let search_path = env::var_os(PACKAGE_PATH_VAR)?;
    find_package_in(&search_path, name)
}

/// Local copy of the description package installed with this crate.
pub fn local_copy() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(PACKAGE_NAME)
}

/// Pick the asset root: explicit override, then the package registry, then
/// the local copy. A missing file in the chosen root surfaces later as a
/// load failure.
pub fn resolve_asset_root(override_path: Option<&Path>) -> AssetRoot {
    if let Some(path) = override_path {
        return AssetRoot {
            path: path.to_path_buf(),
            source: AssetSource::Override,
        };
    }
    match find_package(PACKAGE_NAME) {
        Some(path) => AssetRoot {
            path,
            source: AssetSource::PackageRegistry,
        },
        None => {
            tracing::info!(
                "importing the robot description files from the local copy of the {PACKAGE_NAME} package"
            );
            AssetRoot {
                path: local_copy(),
                source: AssetSource::LocalCopy,
            }
        }
    }
}
