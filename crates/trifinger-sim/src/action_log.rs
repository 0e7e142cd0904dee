//! Record of all actions of an episode, stored as JSON.

use crate::{Action, Pose, Result, TimeIndex};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One appended action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRecord {
    pub t: TimeIndex,
    #[serde(with = "non_finite")]
    pub torque: Vec<f64>,
    #[serde(with = "non_finite")]
    pub position: Vec<f64>,
    #[serde(with = "non_finite")]
    pub position_kp: Vec<f64>,
    #[serde(with = "non_finite")]
    pub position_kd: Vec<f64>,
}

impl ActionRecord {
    pub fn new(t: TimeIndex, action: &Action) -> Self {
        Self {
            t,
            torque: action.torque.clone(),
            position: action.position.clone(),
            position_kp: action.position_kp.clone(),
            position_kd: action.position_kd.clone(),
        }
    }

    pub fn to_action(&self) -> Action {
        Action {
            torque: self.torque.clone(),
            position: self.position.clone(),
            position_kp: self.position_kp.clone(),
            position_kd: self.position_kd.clone(),
        }
    }
}

/// Initial state, every action and the final object pose of an episode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub initial_robot_position: Vec<f64>,
    pub initial_object_pose: Pose,
    pub actions: Vec<ActionRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_object_pose: Option<Pose>,
}

impl ActionLog {
    pub fn new(initial_robot_position: Vec<f64>, initial_object_pose: Pose) -> Self {
        Self {
            initial_robot_position,
            initial_object_pose,
            actions: Vec::new(),
            final_object_pose: None,
        }
    }

    pub fn append(&mut self, t: TimeIndex, action: &Action) {
        self.actions.push(ActionRecord::new(t, action));
    }

    pub fn set_final_object_pose(&mut self, pose: Pose) {
        self.final_object_pose = Some(pose);
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Write the log to `path`, replacing any existing file. Nothing is
    /// written if serialization fails.
    pub fn store(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_vec(self)?;
        fs::write(path, json)?;
        tracing::info!(path = %path.display(), actions = self.len(), "action log stored");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read(path.as_ref())?;
        Ok(serde_json::from_slice(&raw)?)
    }
}

/// JSON has no NaN or infinity. NaN is written as `null`, infinities as the
/// strings `"inf"` and `"-inf"`, and all of them are read back unchanged.
mod non_finite {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    #[serde(untagged)]
    enum Entry {
        Number(f64),
        Special(Option<String>),
    }

    pub fn serialize<S: Serializer>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        let entries: Vec<Entry> = values
            .iter()
            .map(|&v| match v {
                v if v.is_nan() => Entry::Special(None),
                f64::INFINITY => Entry::Special(Some("inf".to_string())),
                f64::NEG_INFINITY => Entry::Special(Some("-inf".to_string())),
                v => Entry::Number(v),
            })
            .collect();
        entries.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        Vec::<Entry>::deserialize(deserializer)?
            .into_iter()
            .map(|entry| match entry {
                Entry::Number(v) => Ok(v),
                Entry::Special(None) => Ok(f64::NAN),
                Entry::Special(Some(s)) => match s.as_str() {
                    "inf" => Ok(f64::INFINITY),
                    "-inf" => Ok(f64::NEG_INFINITY),
                    other => Err(D::Error::custom(format!("invalid number: {other}"))),
                },
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn same(a: &[f64], b: &[f64]) -> bool {
        a.len() == b.len()
            && a
                .iter()
                .zip(b)
                .all(|(x, y)| (x.is_nan() && y.is_nan()) || x == y)
    }

    fn initial_pose() -> Pose {
        Pose {
            position: [0.01, -0.02, 0.0325],
            orientation: [0.0, 0.0, 0.0, 1.0],
        }
    }

    #[test]
    fn test_store_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.json");

        let mut log = ActionLog::new(vec![0.0, -1.2, -2.2], initial_pose());
        let a0 = Action::torque(vec![0.1, 0.123456789012345, -0.3]);
        let a1 = Action::position(vec![0.5, f64::NAN, 0.25]).with_gains(
            vec![1.5, f64::NAN, 3.0],
            vec![f64::NAN, 0.2, 0.3],
        );
        log.append(0, &a0);
        log.append(1, &a1);
        log.set_final_object_pose(initial_pose());
        log.store(&path).unwrap();

        let loaded = ActionLog::load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.actions[1].t, 1);
        assert!(same(&loaded.actions[0].torque, &a0.torque));
        assert!(same(&loaded.actions[1].position, &a1.position));
        assert!(same(&loaded.actions[1].position_kp, &a1.position_kp));
        assert!(same(&loaded.actions[1].position_kd, &a1.position_kd));
        assert_eq!(loaded.final_object_pose, Some(initial_pose()));
    }

    #[test]
    fn test_file_layout() {
        let mut log = ActionLog::new(vec![0.0; 3], initial_pose());
        log.append(0, &Action::zero(3));
        log.set_final_object_pose(initial_pose());
        let value = serde_json::to_value(&log).unwrap();
        for key in [
            "initial_robot_position",
            "initial_object_pose",
            "actions",
            "final_object_pose",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        let action = &value["actions"][0];
        assert_eq!(action["t"], 0);
        assert!(action["position"][0].is_null());
        assert_eq!(value["initial_object_pose"]["orientation"][3], 1.0);
    }

    #[test]
    fn test_store_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.json");
        fs::write(&path, "not json").unwrap();
        ActionLog::new(vec![], initial_pose()).store(&path).unwrap();
        assert!(ActionLog::load(&path).unwrap().is_empty());
    }

    #[test]
    fn test_store_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("log.json");
        let err = ActionLog::new(vec![], initial_pose()).store(&path).unwrap_err();
        assert!(matches!(err, crate::Error::Io(_)));
    }

    #[test]
    fn test_infinite_torques_survive_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.json");
        let mut log = ActionLog::new(vec![0.0; 3], initial_pose());
        log.append(0, &Action::torque(vec![f64::INFINITY, f64::NEG_INFINITY, 0.1]));
        log.store(&path).unwrap();

        let raw: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw["actions"][0]["torque"], serde_json::json!(["inf", "-inf", 0.1]));

        let loaded = ActionLog::load(&path).unwrap();
        assert_eq!(loaded.actions[0].torque, vec![f64::INFINITY, f64::NEG_INFINITY, 0.1]);
    }

    #[test]
    fn test_load_rejects_unknown_marker() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.json");
        fs::write(
            &path,
            r#"{"initial_robot_position":[],"initial_object_pose":{"position":[0,0,0],"orientation":[0,0,0,1]},
               "actions":[{"t":0,"torque":["huge"],"position":[null],"position_kp":[1],"position_kd":[1]}]}"#,
        )
        .unwrap();
        assert!(matches!(
            ActionLog::load(&path),
            Err(crate::Error::Serialization(_))
        ));
    }

    #[test]
    fn test_record_to_action() {
        let action = Action::torque(vec![0.1, 0.2, 0.3]);
        let record = ActionRecord::new(4, &action);
        assert!(same(&record.to_action().torque, &action.torque));
        assert!(same(&record.to_action().position, &action.position));
    }
}
