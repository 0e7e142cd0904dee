//! Stepwise joint control of a simulated finger robot.

use crate::connector::RobotConnector;
use crate::finger_types::JointProperties;
use crate::observation::{resolve_step, StepSlot};
use crate::{Action, Error, Result, RobotObservation, TimeIndex};
use sim_backend::PhysicsBackend;

/// Default control period (s).
pub const DEFAULT_TIME_STEP_S: f64 = 0.004;

/// Simulated counterpart of a robot frontend.
///
/// Every call of [`SimFinger::append_desired_action`] applies the action
/// and advances the simulation by exactly one time step.
pub struct SimFinger<B: PhysicsBackend> {
    connector: RobotConnector<B>,
    time_step_s: f64,
    properties: JointProperties,
    t: Option<TimeIndex>,
    desired_action_t: Option<Action>,
    applied_action_t: Option<Action>,
    observation_t: Option<RobotObservation>,
}

impl<B: PhysicsBackend> SimFinger<B> {
    pub fn new(mut connector: RobotConnector<B>, time_step_s: f64) -> Result<Self> {
        if connector.is_simulation_enabled() {
            connector.backend_mut().set_time_step(time_step_s)?;
        }
        let properties = connector.finger_type().properties();
        Ok(Self {
            connector,
            time_step_s,
            properties,
            t: None,
            desired_action_t: None,
            applied_action_t: None,
            observation_t: None,
        })
    }

    pub fn connector(&self) -> &RobotConnector<B> {
        &self.connector
    }

    pub fn connector_mut(&mut self) -> &mut RobotConnector<B> {
        &mut self.connector
    }

    pub fn number_of_joints(&self) -> usize {
        self.connector.topology().link_names.len()
    }

    pub fn time_step_s(&self) -> f64 {
        self.time_step_s
    }

    pub fn properties(&self) -> &JointProperties {
        &self.properties
    }

    /// Zero torque, no position control, default gains.
    pub fn zero_action(&self) -> Action {
        Action::zero(self.number_of_joints())
    }

    /// Apply `action`, step the simulation and return the index of the step.
    pub fn append_desired_action(&mut self, action: &Action) -> Result<TimeIndex> {
        self.check_dimensions(action)?;
        let applied = self.set_desired_action(action)?;

        // save the state the action is applied to, then step
        let observation = self.latest_observation()?;
        self.step_simulation()?;

        let t = self.t.map_or(0, |t| t + 1);
        self.t = Some(t);
        self.desired_action_t = Some(action.clone());
        self.applied_action_t = Some(applied);
        self.observation_t = Some(observation);
        tracing::trace!(t, "appended action");
        Ok(t)
    }

    /// Index of the last executed step, `None` before the first action.
    pub fn get_current_timeindex(&self) -> Option<TimeIndex> {
        self.t
    }

    pub fn get_desired_action(&self, t: TimeIndex) -> Result<&Action> {
        self.current_only(t, self.desired_action_t.as_ref())
    }

    /// Action as sent to the motors: gains with defaults filled in and
    /// torques after PD control and safety checks.
    pub fn get_applied_action(&self, t: TimeIndex) -> Result<&Action> {
        self.current_only(t, self.applied_action_t.as_ref())
    }

    /// Joint state the action of step `t` was applied to (`t == current`),
    /// or the state reached afterwards (`t == current + 1`).
    pub fn get_observation(&self, t: TimeIndex) -> Result<RobotObservation> {
        match resolve_step(self.t, t)? {
            StepSlot::Current => self
                .observation_t
                .clone()
                .ok_or(Error::InvalidTimeIndex {
                    requested: t,
                    current: self.t,
                }),
            StepSlot::Next => self.latest_observation(),
        }
    }

    pub fn get_timestamp_ms(&self, t: TimeIndex) -> Result<f64> {
        resolve_step(self.t, t)?;
        Ok(self.time_step_s * 1000.0 * t as f64)
    }

    /// Teleport the joints; velocities default to zero.
    pub fn reset_finger_positions_and_velocities(
        &mut self,
        positions: &[f64],
        velocities: Option<&[f64]>,
    ) -> Result<RobotObservation> {
        let n = self.number_of_joints();
        check_len("position", n, positions.len())?;
        if let Some(v) = velocities {
            check_len("velocity", n, v.len())?;
        }
        if let Some(robot) = self.connector.robot().cloned() {
            let backend = self.connector.backend_mut();
            for (i, (&joint, &q)) in robot.joint_indices.iter().zip(positions).enumerate() {
                let qd = velocities.map_or(0.0, |v| v[i]);
                backend.reset_joint_state(robot.body, joint, q, qd)?;
            }
        }
        self.latest_observation()
    }

    fn current_only<'a>(&self, t: TimeIndex, value: Option<&'a Action>) -> Result<&'a Action> {
        match (resolve_step(self.t, t)?, value) {
            (StepSlot::Current, Some(action)) => Ok(action),
            _ => Err(Error::InvalidTimeIndex {
                requested: t,
                current: self.t,
            }),
        }
    }

    fn check_dimensions(&self, action: &Action) -> Result<()> {
        let n = self.number_of_joints();
        check_len("torque", n, action.torque.len())?;
        check_len("position", n, action.position.len())?;
        check_len("position_kp", n, action.position_kp.len())?;
        check_len("position_kd", n, action.position_kd.len())
    }

    /// Compute the motor torques for `desired` and send them to the backend.
    fn set_desired_action(&mut self, desired: &Action) -> Result<Action> {
        let state = self.latest_observation()?;
        let props = &self.properties;

        let kp = fill_nan(&desired.position_kp, &props.position_gains);
        let kd = fill_nan(&desired.position_kd, &props.velocity_gains);

        let mut torque = desired.torque.clone();
        for (i, tau) in torque.iter_mut().enumerate() {
            let feedback =
                kp[i] * (desired.position[i] - state.position[i]) - kd[i] * state.velocity[i];
            // NaN position targets disable the feedback for that joint
            if !feedback.is_nan() {
                *tau += feedback;
            }
        }
        let torque = safety_check_torques(&torque, &state.velocity, props);

        if let Some(robot) = self.connector.robot().cloned() {
            self.connector
                .backend_mut()
                .set_joint_torques(robot.body, &robot.joint_indices, &torque)?;
        }

        Ok(Action {
            torque,
            position: desired.position.clone(),
            position_kp: kp,
            position_kd: kd,
        })
    }

    fn step_simulation(&mut self) -> Result<()> {
        if self.connector.is_simulation_enabled() {
            self.connector.backend_mut().step_simulation()?;
        }
        Ok(())
    }

    /// Joint state right now; all zeros while the simulation is disabled.
    fn latest_observation(&self) -> Result<RobotObservation> {
        let Some(robot) = self.connector.robot() else {
            let n = self.number_of_joints();
            return Ok(RobotObservation {
                position: vec![0.0; n],
                velocity: vec![0.0; n],
                torque: vec![0.0; n],
            });
        };
        let states = self
            .connector
            .backend()
            .joint_states(robot.body, &robot.joint_indices)?;
        Ok(RobotObservation {
            position: states.iter().map(|s| s.position).collect(),
            velocity: states.iter().map(|s| s.velocity).collect(),
            torque: states.iter().map(|s| s.motor_torque).collect(),
        })
    }
}

fn check_len(field: &'static str, expected: usize, got: usize) -> Result<()> {
    if expected == got {
        Ok(())
    } else {
        Err(Error::ActionDimension {
            field,
            expected,
            got,
        })
    }
}

fn fill_nan(values: &[f64], defaults: &[f64]) -> Vec<f64> {
    values
        .iter()
        .zip(defaults)
        .map(|(&v, &d)| if v.is_nan() { d } else { v })
        .collect()
}

/// Clip to the motor limit, add velocity damping and clip again.
fn safety_check_torques(torque: &[f64], velocity: &[f64], props: &JointProperties) -> Vec<f64> {
    let max = props.max_motor_torque;
    torque
        .iter()
        .zip(velocity)
        .zip(&props.safety_kd)
        .map(|((&tau, &qd), &kd)| (tau.clamp(-max, max) - kd * qd).clamp(-max, max))
        .collect()
}
