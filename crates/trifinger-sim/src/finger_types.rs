//! Supported finger types and the data that depends on them.

use crate::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FingerType {
    FingerOne,
    TriFingerOne,
    FingerEdu,
    TriFingerEdu,
    FingerPro,
    TriFingerPro,
}

/// Result of resolving a finger type name.
///
/// `deprecated_alias` is set when the name was one of the legacy aliases;
/// the finger type is still usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerTypeCheck {
    pub finger_type: FingerType,
    pub deprecated_alias: Option<&'static str>,
}

const DEPRECATED_ALIASES: [(&str, FingerType); 2] = [
    ("single", FingerType::FingerOne),
    ("tri", FingerType::TriFingerOne),
];

/// Remembers which deprecated aliases were already reported.
#[derive(Debug, Default)]
pub struct DeprecationWarnings {
    single: AtomicBool,
    tri: AtomicBool,
}

impl DeprecationWarnings {
    pub const fn new() -> Self {
        Self {
            single: AtomicBool::new(false),
            tri: AtomicBool::new(false),
        }
    }

    /// Log the warning for `alias` unless it was logged before. Returns
    /// whether a warning was emitted.
    pub fn warn(&self, alias: &str) -> bool {
        let flag = match alias {
            "single" => &self.single,
            "tri" => &self.tri,
            _ => return false,
        };
        if flag.swap(true, Ordering::SeqCst) {
            return false;
        }
        tracing::warn!(
            alias,
            "finger types 'single' and 'tri' are deprecated, use 'fingerone' and 'trifingerone' instead"
        );
        true
    }
}

static DEPRECATION_WARNINGS: DeprecationWarnings = DeprecationWarnings::new();

impl FingerType {
    pub const ALL: [FingerType; 6] = [
        FingerType::FingerOne,
        FingerType::TriFingerOne,
        FingerType::FingerEdu,
        FingerType::TriFingerEdu,
        FingerType::FingerPro,
        FingerType::TriFingerPro,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FingerType::FingerOne => "fingerone",
            FingerType::TriFingerOne => "trifingerone",
            FingerType::FingerEdu => "fingeredu",
            FingerType::TriFingerEdu => "trifingeredu",
            FingerType::FingerPro => "fingerpro",
            FingerType::TriFingerPro => "trifingerpro",
        }
    }

    /// Robot description file, relative to the `urdf` directory of the
    /// asset package.
    pub fn urdf_file(self) -> &'static str {
        match self {
            FingerType::FingerOne => "finger.urdf",
            FingerType::TriFingerOne => "trifinger.urdf",
            FingerType::FingerEdu => "edu/fingeredu.urdf",
            FingerType::TriFingerEdu => "edu/trifingeredu.urdf",
            FingerType::FingerPro => "pro/fingerpro.urdf",
            FingerType::TriFingerPro => "pro/trifingerpro.urdf",
        }
    }

    pub fn number_of_fingers(self) -> usize {
        match self {
            FingerType::FingerOne | FingerType::FingerEdu | FingerType::FingerPro => 1,
            FingerType::TriFingerOne | FingerType::TriFingerEdu | FingerType::TriFingerPro => 3,
        }
    }

    pub fn number_of_joints(self) -> usize {
        JOINTS_PER_FINGER * self.number_of_fingers()
    }

    pub fn topology(self) -> JointTopology {
        JointTopology::for_fingers(self.number_of_fingers())
    }

    pub fn properties(self) -> JointProperties {
        let per_finger = match self {
            FingerType::FingerOne
            | FingerType::TriFingerOne
            | FingerType::FingerEdu
            | FingerType::TriFingerEdu => FingerProperties {
                max_motor_torque: 0.36,
                safety_kd: [0.08, 0.08, 0.04],
                position_gains: [10.0, 10.0, 10.0],
                velocity_gains: [0.1, 0.3, 0.001],
            },
            FingerType::FingerPro | FingerType::TriFingerPro => FingerProperties {
                max_motor_torque: 0.396,
                safety_kd: [0.08, 0.08, 0.04],
                position_gains: [15.0, 15.0, 9.0],
                velocity_gains: [0.5, 1.0, 0.5],
            },
        };
        per_finger.tile(self.number_of_fingers())
    }
}

impl std::fmt::Display for FingerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for FingerType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        check_finger_type(s).map(|c| c.finger_type)
    }
}

/// Names accepted by [`check_finger_type`], deprecated aliases excluded.
pub fn get_valid_finger_types() -> Vec<&'static str> {
    FingerType::ALL.iter().map(|t| t.name()).collect()
}

/// Resolve a finger type name, mapping deprecated aliases to their
/// replacement.
pub fn check_finger_type(name: &str) -> Result<FingerTypeCheck> {
    if let Some(finger_type) = FingerType::ALL.iter().copied().find(|t| t.name() == name) {
        return Ok(FingerTypeCheck {
            finger_type,
            deprecated_alias: None,
        });
    }
    DEPRECATED_ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|&(alias, finger_type)| FingerTypeCheck {
            finger_type,
            deprecated_alias: Some(alias),
        })
        .ok_or_else(|| Error::UnknownFingerType(name.to_string()))
}

/// Log the deprecation warning for `alias` the first time it is used in this
/// process. Returns whether a warning was emitted.
pub fn warn_deprecated(alias: &str) -> bool {
    DEPRECATION_WARNINGS.warn(alias)
}

pub const JOINTS_PER_FINGER: usize = 3;

/// Link names in joint order plus the fingertip links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JointTopology {
    pub link_names: Vec<String>,
    pub tip_link_names: Vec<String>,
}

impl JointTopology {
    fn for_fingers(number_of_fingers: usize) -> Self {
        static SEGMENTS: [&str; JOINTS_PER_FINGER] = ["upper", "middle", "lower"];
        if number_of_fingers == 1 {
            return Self {
                link_names: SEGMENTS
                    .iter()
                    .map(|s| format!("finger_{s}_link"))
                    .collect(),
                tip_link_names: vec!["finger_tip_link".to_string()],
            };
        }
        let angles = ["0", "120", "240"];
        Self {
            link_names: angles
                .iter()
                .flat_map(|a| SEGMENTS.iter().map(move |s| format!("finger_{s}_link_{a}")))
                .collect(),
            tip_link_names: angles
                .iter()
                .map(|a| format!("finger_tip_link_{a}"))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct FingerProperties {
    max_motor_torque: f64,
    safety_kd: [f64; JOINTS_PER_FINGER],
    position_gains: [f64; JOINTS_PER_FINGER],
    velocity_gains: [f64; JOINTS_PER_FINGER],
}

impl FingerProperties {
    fn tile(&self, fingers: usize) -> JointProperties {
        let tile = |v: &[f64; JOINTS_PER_FINGER]| v.repeat(fingers);
        JointProperties {
            max_motor_torque: self.max_motor_torque,
            safety_kd: tile(&self.safety_kd),
            position_gains: tile(&self.position_gains),
            velocity_gains: tile(&self.velocity_gains),
        }
    }
}

/// Motor limits and default controller gains for all joints of a robot.
#[derive(Debug, Clone, PartialEq)]
pub struct JointProperties {
    /// Symmetric torque limit (Nm)
    pub max_motor_torque: f64,
    /// Velocity damping applied on top of every command
    pub safety_kd: Vec<f64>,
    /// Default `kp` of the position controller
    pub position_gains: Vec<f64>,
    /// Default `kd` of the position controller
    pub velocity_gains: Vec<f64>,
}
