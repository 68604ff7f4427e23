//! Background control loop.
//!
//! Spawns a thread that owns the `GripperController` and ticks it at the
//! configured update rate against a `Clock`.
//!
//! Safety: Each `ControlLoop` spawns exactly one thread that is
//! automatically shut down when the `ControlLoop` is dropped, preventing
//! thread leaks. Shutdown disengages the controller first, so an active
//! goal is aborted rather than silently dropped.

use crate::adapter::HwIfaceAdapter;
use crate::controller::GripperController;
use gripper_traits::clock::Clock;
use gripper_traits::{JointCommand, JointSensor};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

pub struct ControlLoop {
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl ControlLoop {
    /// Take ownership of the controller and tick it every `period` until
    /// shutdown.
    pub fn spawn<S, C, A, K>(
        mut controller: GripperController<S, C, A>,
        period: Duration,
        clock: K,
    ) -> Self
    where
        S: JointSensor + Send + 'static,
        C: JointCommand + Send + 'static,
        A: HwIfaceAdapter + 'static,
        K: Clock + Send + Sync + 'static,
    {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let epoch = clock.now();

        let join_handle = std::thread::spawn(move || {
            loop {
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!("control loop received shutdown signal");
                    break;
                }
                controller.update(clock.ms_since(epoch));
                if shutdown_clone.load(Ordering::Relaxed) {
                    break;
                }
                clock.sleep(period);
            }
            controller.disengage(clock.ms_since(epoch));
            tracing::trace!("control loop thread exiting cleanly");
        });

        Self {
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    /// Request shutdown without waiting for the thread to exit.
    pub fn request_stop(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

impl Drop for ControlLoop {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => {
                    tracing::trace!("control loop thread joined successfully");
                }
                Err(e) => {
                    tracing::warn!(?e, "control loop thread panicked during shutdown");
                }
            }
        }
    }
}
