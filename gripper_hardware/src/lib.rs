//! Hardware backends for the gripper controller.
//!
//! Only a simulated single-DOF joint ships here; real joints implement
//! `gripper_traits::{JointSensor, JointCommand}` in their own crate.

pub mod error;
pub mod sim;

pub use sim::{SimHandle, SimJoint};

#[cfg(test)]
mod tests {
    use super::sim::SimJoint;
    use gripper_traits::{JointCommand, JointSensor};

    #[test]
    fn simulated_joint_moves_toward_command() {
        let joint = SimJoint::new(0.08, 1.0, 0.01);
        let (mut sensor, mut command) = joint.split();
        command.write(0.0).unwrap();
        let mut last = f64::MAX;
        for _ in 0..20 {
            let r = sensor.read().unwrap();
            assert!(r.position <= last);
            last = r.position;
        }
        assert!(last.abs() < 1e-9, "should have reached 0.0, got {last}");
    }

    #[test]
    fn obstruction_stops_motion_short_of_command() {
        let joint = SimJoint::new(0.08, 1.0, 0.01);
        joint.handle().set_obstruction(Some(0.05));
        let (mut sensor, mut command) = joint.split();
        command.write(0.0).unwrap();
        let mut r = sensor.read().unwrap();
        for _ in 0..40 {
            r = sensor.read().unwrap();
        }
        assert!((r.position - 0.05).abs() < 1e-9);
        assert_eq!(r.velocity, 0.0);
    }
}
