//! Simulated single-DOF gripper joint.
//!
//! The jaw moves toward the last commanded position at a fixed slew rate,
//! advancing one time step per sensor read. An optional obstruction models
//! an object in the jaws: closing motion stops at the obstruction position
//! with zero velocity, which is the stall case the controller must detect.

use crate::error::HwError;
use gripper_traits::{JointCommand, JointReading, JointSensor};
use std::sync::{Arc, Mutex};

#[derive(Debug)]
struct SimState {
    position: f64,
    velocity: f64,
    commanded: f64,
    obstruction: Option<f64>,
    faulted: bool,
}

/// Simulated joint; split into sensor and command halves for the controller.
pub struct SimJoint {
    state: Arc<Mutex<SimState>>,
    /// Max jaw travel per simulated second.
    speed: f64,
    /// Simulated seconds advanced per sensor read.
    dt: f64,
}

impl SimJoint {
    pub fn new(start_position: f64, speed: f64, dt: f64) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                position: start_position,
                velocity: 0.0,
                commanded: start_position,
                obstruction: None,
                faulted: false,
            })),
            speed: speed.abs(),
            dt: dt.abs().max(1e-6),
        }
    }

    /// External handle for tests and the CLI: place objects, inject faults.
    pub fn handle(&self) -> SimHandle {
        SimHandle {
            state: self.state.clone(),
        }
    }

    pub fn split(self) -> (SimSensor, SimCommand) {
        let sensor = SimSensor {
            state: self.state.clone(),
            speed: self.speed,
            dt: self.dt,
        };
        let command = SimCommand { state: self.state };
        (sensor, command)
    }
}

#[derive(Clone)]
pub struct SimHandle {
    state: Arc<Mutex<SimState>>,
}

impl SimHandle {
    /// Place (or remove) an object: closing motion cannot pass below `at`.
    pub fn set_obstruction(&self, at: Option<f64>) {
        if let Ok(mut s) = self.state.lock() {
            s.obstruction = at;
        }
    }

    /// When set, sensor reads and command writes fail until cleared.
    pub fn set_faulted(&self, faulted: bool) {
        if let Ok(mut s) = self.state.lock() {
            s.faulted = faulted;
        }
    }

    pub fn position(&self) -> f64 {
        self.state.lock().map(|s| s.position).unwrap_or(f64::NAN)
    }
}

pub struct SimSensor {
    state: Arc<Mutex<SimState>>,
    speed: f64,
    dt: f64,
}

impl SimSensor {
    /// Advance the jaw one time step toward the commanded position.
    fn step(&self, s: &mut SimState) {
        let mut target = s.commanded;
        if let Some(floor) = s.obstruction
            && target < floor
        {
            // The object blocks further closing.
            target = floor;
        }
        let max_travel = self.speed * self.dt;
        let delta = (target - s.position).clamp(-max_travel, max_travel);
        s.position += delta;
        s.velocity = delta / self.dt;
    }
}

impl JointSensor for SimSensor {
    fn read(&mut self) -> Result<JointReading, Box<dyn std::error::Error + Send + Sync>> {
        let mut s = self
            .state
            .lock()
            .map_err(|_| Box::new(HwError::NotReady) as Box<dyn std::error::Error + Send + Sync>)?;
        if s.faulted {
            return Err(Box::new(HwError::StateRead("simulated fault".into())));
        }
        self.step(&mut s);
        tracing::trace!(position = s.position, velocity = s.velocity, "sim sample");
        Ok(JointReading {
            position: s.position,
            velocity: s.velocity,
        })
    }
}

pub struct SimCommand {
    state: Arc<Mutex<SimState>>,
}

impl JointCommand for SimCommand {
    fn write(&mut self, value: f64) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut s = self
            .state
            .lock()
            .map_err(|_| Box::new(HwError::NotReady) as Box<dyn std::error::Error + Send + Sync>)?;
        if s.faulted {
            return Err(Box::new(HwError::CommandWrite("simulated fault".into())));
        }
        s.commanded = value;
        Ok(())
    }
}
