//! Test and helper mocks for gripper_core

use gripper_traits::{JointCommand, JointReading, JointSensor};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct ScriptState {
    readings: Vec<JointReading>,
    cursor: usize,
    writes: Vec<f64>,
}

/// A joint driven by a pre-scripted sequence of readings. The last reading
/// repeats once the script is exhausted. Commanded values are recorded and
/// can be inspected from a clone.
#[derive(Debug, Clone, Default)]
pub struct ScriptedJoint {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedJoint {
    pub fn new(readings: Vec<JointReading>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ScriptState {
                readings,
                cursor: 0,
                writes: Vec::new(),
            })),
        }
    }

    /// Every value written so far, oldest first.
    pub fn writes(&self) -> Vec<f64> {
        self.state.lock().map(|s| s.writes.clone()).unwrap_or_default()
    }

    pub fn last_write(&self) -> Option<f64> {
        self.state.lock().ok().and_then(|s| s.writes.last().copied())
    }
}

impl JointSensor for ScriptedJoint {
    fn read(&mut self) -> Result<JointReading, Box<dyn std::error::Error + Send + Sync>> {
        let mut s = self
            .state
            .lock()
            .map_err(|_| {
                Box::new(std::io::Error::other("script poisoned"))
                    as Box<dyn std::error::Error + Send + Sync>
            })?;
        if s.readings.is_empty() {
            return Err(Box::new(std::io::Error::other("script exhausted")));
        }
        let idx = s.cursor.min(s.readings.len() - 1);
        s.cursor += 1;
        Ok(s.readings[idx])
    }
}

impl JointCommand for ScriptedJoint {
    fn write(&mut self, value: f64) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut s = self
            .state
            .lock()
            .map_err(|_| {
                Box::new(std::io::Error::other("script poisoned"))
                    as Box<dyn std::error::Error + Send + Sync>
            })?;
        s.writes.push(value);
        Ok(())
    }
}

/// A sensor that always errors on read; useful for fault-path tests.
pub struct FailingSensor;

impl JointSensor for FailingSensor {
    fn read(&mut self) -> Result<JointReading, Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("sensor offline")))
    }
}

pub fn failing_sensor() -> FailingSensor {
    FailingSensor
}
