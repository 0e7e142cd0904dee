//! Single-slot cache of the observations sampled before the latest step.

use crate::{Error, ObjectPose, Result, TimeIndex, TriCameraObservation};

/// Which state a valid time index refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepSlot {
    /// The state sampled right before the current step was executed.
    Current,
    /// The state reached after the current step.
    Next,
}

/// Map `requested` onto the two indices that can be answered: the current
/// one and the one after it. Nothing is valid before the first step.
pub fn resolve_step(current: Option<TimeIndex>, requested: TimeIndex) -> Result<StepSlot> {
    match current {
        Some(c) if requested == c => Ok(StepSlot::Current),
        Some(c) if Some(requested) == c.checked_add(1) => Ok(StepSlot::Next),
        _ => Err(Error::InvalidTimeIndex { requested, current }),
    }
}

/// Object pose and camera images of the state an action was applied to.
#[derive(Debug, Clone, Default)]
pub enum ObservationCache {
    #[default]
    Empty,
    ValidForStep {
        step: TimeIndex,
        pose: ObjectPose,
        cameras: Option<TriCameraObservation>,
    },
}

/// Answer of a cache lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup<'a, T> {
    /// Cached pre-step sample.
    Cached(&'a T),
    /// The caller has to sample the state now.
    Fresh,
}

impl ObservationCache {
    /// Replace the slot with a sample taken for `step`.
    pub fn store(&mut self, step: TimeIndex, pose: ObjectPose, cameras: Option<TriCameraObservation>) {
        *self = ObservationCache::ValidForStep {
            step,
            pose,
            cameras,
        };
    }

    pub fn step(&self) -> Option<TimeIndex> {
        match self {
            ObservationCache::Empty => None,
            ObservationCache::ValidForStep { step, .. } => Some(*step),
        }
    }

    pub fn object_pose(&self, requested: TimeIndex) -> Result<Lookup<'_, ObjectPose>> {
        match (resolve_step(self.step(), requested)?, self) {
            (StepSlot::Current, ObservationCache::ValidForStep { pose, .. }) => {
                Ok(Lookup::Cached(pose))
            }
            _ => Ok(Lookup::Fresh),
        }
    }

    /// Cached images are only present if cameras were rendered for the step.
    pub fn cameras(&self, requested: TimeIndex) -> Result<Lookup<'_, TriCameraObservation>> {
        match (resolve_step(self.step(), requested)?, self) {
            (
                StepSlot::Current,
                ObservationCache::ValidForStep {
                    cameras: Some(cameras),
                    ..
                },
            ) => Ok(Lookup::Cached(cameras)),
            _ => Ok(Lookup::Fresh),
        }
    }
}
