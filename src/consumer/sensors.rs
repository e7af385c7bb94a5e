// SPDX-License-Identifier: GPL-3.0-or-later
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::render::is_motion;
use crate::source::{Coordinator, ListenerId, ScalarKind};
use crate::temperature::Temperature;

/// One of the frame statistics, as a temperature sensor.
#[derive(Clone, Debug)]
pub struct Thermometer {
    coordinator: Arc<Coordinator>,
    kind: ScalarKind,
}

impl Thermometer {
    pub fn new(coordinator: &Arc<Coordinator>, kind: ScalarKind) -> Self {
        Self {
            coordinator: Arc::clone(coordinator),
            kind,
        }
    }

    /// One thermometer for each of lowest, highest and average.
    pub fn all(coordinator: &Arc<Coordinator>) -> Vec<Self> {
        ScalarKind::ALL
            .iter()
            .map(|kind| Self::new(coordinator, *kind))
            .collect()
    }

    pub fn kind(&self) -> ScalarKind {
        self.kind
    }

    /// The current value in degrees Celsius, or `None` until a frame has been received.
    pub fn value(&self) -> Option<f32> {
        self.coordinator.scalar(self.kind)
    }

    pub fn temperature(&self) -> Option<Temperature> {
        self.value().map(Temperature::Celsius)
    }
}

/// A binary sensor that is on while the hottest point of the latest frame is well above the
/// average.
#[derive(Debug)]
pub struct MotionSensor {
    coordinator: Arc<Coordinator>,
    listener: ListenerId,
    state: Arc<AtomicBool>,
}

impl MotionSensor {
    pub fn new(coordinator: &Arc<Coordinator>, threshold: f32) -> Self {
        let state = Arc::new(AtomicBool::new(false));
        let listener_state = Arc::clone(&state);
        let listener = coordinator.add_listener(move |record| {
            let motion = is_motion(record.max_value, record.avg_value, threshold);
            if listener_state.swap(motion, Ordering::AcqRel) != motion {
                debug!(
                    motion,
                    max = record.max_value,
                    avg = record.avg_value,
                    "Motion state changed"
                );
            }
        });
        Self {
            coordinator: Arc::clone(coordinator),
            listener,
            state,
        }
    }

    pub fn is_on(&self) -> bool {
        self.state.load(Ordering::Acquire)
    }
}

impl Drop for MotionSensor {
    fn drop(&mut self) {
        self.coordinator.remove_listener(self.listener);
    }
}
