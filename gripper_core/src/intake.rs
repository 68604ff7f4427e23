//! Non-real-time goal intake: accepts, preempts, and cancels goals, and
//! dispatches terminal notifications to the result sink.
//!
//! The intake is the only writer of the command slot and the only consumer
//! of the done queue, so goal handles created here are retained until their
//! outcome has been handed to the sink. That retention also guarantees the
//! control cycle never performs the final drop of a handle.

use crate::command::{Command, CommandRequest};
use crate::config::ControlSettings;
use crate::controller::Feedback;
use crate::error::GoalError;
use crate::goal::{GoalHandle, GoalId, GoalStatus};
use crate::rt_slot::{SlotReader, SlotWriter};
use crossbeam_channel::Receiver;
use gripper_traits::ResultSink;
use std::sync::Arc;
use tracing::{debug, info};

/// What a cancel request found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The goal was active and is now canceled; the joint holds position.
    Canceled,
    /// No active goal with that id; already terminal or never known.
    NotFound,
}

pub struct GoalIntake {
    requests: SlotWriter<CommandRequest>,
    feedback: SlotReader<Feedback>,
    done_rx: Receiver<Arc<GoalHandle>>,
    sink: Box<dyn ResultSink + Send>,
    settings: ControlSettings,

    /// Handles not yet dispatched; swept on every `dispatch_pending`.
    retained: Vec<Arc<GoalHandle>>,
    current: Option<Arc<GoalHandle>>,
    next_id: u64,
    engaged: bool,
    last_feedback: Feedback,
}

impl GoalIntake {
    pub(crate) fn new(
        requests: SlotWriter<CommandRequest>,
        feedback: SlotReader<Feedback>,
        done_rx: Receiver<Arc<GoalHandle>>,
        sink: Box<dyn ResultSink + Send>,
        settings: ControlSettings,
        initial_position: f64,
    ) -> Self {
        Self {
            requests,
            feedback,
            done_rx,
            sink,
            settings,
            retained: Vec::new(),
            current: None,
            next_id: 1,
            engaged: true,
            last_feedback: Feedback {
                position: initial_position,
                ..Feedback::default()
            },
        }
    }

    /// Latest joint snapshot published by the control cycle.
    pub fn feedback(&mut self) -> Feedback {
        if let Some(fb) = self.feedback.read() {
            self.last_feedback = *fb;
        }
        self.last_feedback
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged
    }

    /// Accept a new goal, preempting any goal still active. The previous
    /// goal is canceled before the new command is published, so the slot
    /// never exposes the old goal with the new target.
    pub fn submit(
        &mut self,
        position: f64,
        max_effort: Option<f64>,
    ) -> Result<Arc<GoalHandle>, GoalError> {
        if !self.engaged {
            return Err(GoalError::NotEngaged);
        }
        let effort = max_effort.unwrap_or(self.settings.default_max_effort);
        if !position.is_finite() {
            return Err(GoalError::NonFinitePosition);
        }
        if !effort.is_finite() {
            return Err(GoalError::NonFiniteEffort);
        }

        let observed = self.feedback().position;
        if let Some(prev) = self.current.take() {
            if prev.finish(GoalStatus::Canceled, observed, 0.0, false) {
                info!(goal = %prev.id(), "goal preempted by new submission");
            }
        }

        let id = GoalId(self.next_id);
        self.next_id += 1;
        let goal = GoalHandle::new(id);
        self.retained.push(Arc::clone(&goal));
        self.current = Some(Arc::clone(&goal));
        self.requests.publish(CommandRequest {
            command: Command {
                position,
                max_effort: effort.abs(),
            },
            goal: Some(Arc::clone(&goal)),
        });
        debug!(goal = %id, position, effort = effort.abs(), "goal accepted");
        Ok(goal)
    }

    /// Cancel the active goal if `id` names it; the joint then holds the
    /// position observed at cancellation. Canceling a goal that already
    /// terminated reports `NotFound`.
    pub fn cancel(&mut self, id: GoalId) -> CancelOutcome {
        let observed = self.feedback().position;
        let Some(goal) = self
            .current
            .as_ref()
            .filter(|g| g.id() == id && g.is_active())
            .map(Arc::clone)
        else {
            return CancelOutcome::NotFound;
        };
        self.current = None;
        if !goal.finish(GoalStatus::Canceled, observed, 0.0, false) {
            // The control cycle terminated it first; its outcome stands.
            return CancelOutcome::NotFound;
        }
        self.requests
            .publish(CommandRequest::hold(observed, self.settings.default_max_effort));
        info!(goal = %id, position = observed, "goal canceled, holding position");
        CancelOutcome::Canceled
    }

    /// Drain the done queue and sweep retained handles, forwarding each
    /// terminal outcome to the sink exactly once. Called at the action
    /// monitor cadence.
    pub fn dispatch_pending(&mut self) {
        while let Ok(goal) = self.done_rx.try_recv() {
            if let Some(out) = goal.take_outcome() {
                self.sink.notify(out);
            }
        }
        // Fallback for notifications that never made it into the queue
        // (full queue, or intake-side terminations).
        let sink = &mut self.sink;
        self.retained.retain(|goal| {
            if let Some(out) = goal.take_outcome() {
                sink.notify(out);
            }
            goal.is_active()
        });
        if self
            .current
            .as_ref()
            .is_some_and(|g| !g.is_active())
        {
            self.current = None;
        }
    }

    /// Re-enter the engaged state; goals are accepted again.
    pub fn engage(&mut self) {
        self.engaged = true;
    }

    /// Leave the engaged state: the active goal is aborted and the joint
    /// holds the last observed position. Submissions are rejected until
    /// `engage`.
    pub fn disengage(&mut self) {
        let observed = self.feedback().position;
        if let Some(goal) = self.current.take() {
            if goal.finish(GoalStatus::Aborted, observed, 0.0, false) {
                info!(goal = %goal.id(), "goal aborted on disengage");
            }
        }
        self.requests
            .publish(CommandRequest::hold(observed, self.settings.default_max_effort));
        self.engaged = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rt_slot::rt_slot;
    use crossbeam_channel::bounded;
    use gripper_traits::{GoalOutcome, TerminalStatus};
    use std::sync::Mutex;

    #[derive(Default, Clone)]
    struct RecordingSink(Arc<Mutex<Vec<GoalOutcome>>>);

    impl ResultSink for RecordingSink {
        fn notify(&mut self, outcome: GoalOutcome) {
            if let Ok(mut v) = self.0.lock() {
                v.push(outcome);
            }
        }
    }

    fn intake() -> (
        GoalIntake,
        SlotReader<CommandRequest>,
        crossbeam_channel::Sender<Arc<GoalHandle>>,
        RecordingSink,
    ) {
        let (req_w, req_r) = rt_slot(CommandRequest::hold(0.1, 0.0));
        let (_fb_w, fb_r) = rt_slot(Feedback::default());
        let (tx, rx) = bounded(16);
        let sink = RecordingSink::default();
        let it = GoalIntake::new(
            req_w,
            fb_r,
            rx,
            Box::new(sink.clone()),
            ControlSettings::default(),
            0.1,
        );
        (it, req_r, tx, sink)
    }

    #[test]
    fn submit_publishes_goal_and_command_together() {
        let (mut it, mut req_r, _tx, _sink) = intake();
        let goal = it.submit(0.02, Some(30.0)).expect("accepted");
        let req = req_r.read().expect("published");
        assert_eq!(req.command.position, 0.02);
        assert_eq!(req.command.max_effort, 30.0);
        assert_eq!(req.goal.as_ref().map(|g| g.id()), Some(goal.id()));
    }

    #[test]
    fn non_finite_submissions_are_rejected_without_publishing() {
        let (mut it, mut req_r, _tx, _sink) = intake();
        assert!(matches!(
            it.submit(f64::NAN, None),
            Err(GoalError::NonFinitePosition)
        ));
        assert!(matches!(
            it.submit(0.0, Some(f64::INFINITY)),
            Err(GoalError::NonFiniteEffort)
        ));
        assert!(req_r.read().is_none(), "slot must stay untouched");
    }

    #[test]
    fn missing_effort_falls_back_to_the_configured_default() {
        let (mut it, mut req_r, _tx, _sink) = intake();
        it.submit(0.02, None).expect("accepted");
        assert_eq!(req_r.read().expect("published").command.max_effort, 0.0);
    }

    #[test]
    fn submission_preempts_the_previous_goal() {
        let (mut it, mut req_r, _tx, sink) = intake();
        let a = it.submit(0.05, Some(10.0)).expect("a");
        let b = it.submit(0.02, Some(10.0)).expect("b");

        assert_eq!(a.status(), GoalStatus::Canceled);
        assert!(b.is_active());
        let req = req_r.read().expect("latest publication wins");
        assert_eq!(req.goal.as_ref().map(|g| g.id()), Some(b.id()));

        it.dispatch_pending();
        let outs = sink.0.lock().expect("lock");
        assert_eq!(outs.len(), 1);
        assert_eq!(outs[0].status, TerminalStatus::Canceled);
        assert_eq!(outs[0].id, a.id().0);
    }

    #[test]
    fn cancel_of_terminal_goal_is_not_found_and_not_duplicated() {
        let (mut it, _req_r, _tx, sink) = intake();
        let goal = it.submit(0.02, Some(10.0)).expect("accepted");
        // The control cycle finished it.
        goal.finish(GoalStatus::Succeeded, 0.021, 2.0, false);

        assert_eq!(it.cancel(goal.id()), CancelOutcome::NotFound);
        it.dispatch_pending();
        it.dispatch_pending();
        let outs = sink.0.lock().expect("lock");
        assert_eq!(outs.len(), 1, "exactly one notification");
        assert_eq!(outs[0].status, TerminalStatus::Succeeded);
    }

    #[test]
    fn cancel_publishes_a_hold_request() {
        let (mut it, mut req_r, _tx, _sink) = intake();
        let goal = it.submit(0.02, Some(10.0)).expect("accepted");
        assert_eq!(it.cancel(goal.id()), CancelOutcome::Canceled);
        let req = req_r.read().expect("hold published");
        assert!(req.goal.is_none());
        assert_eq!(req.command.position, 0.1, "holds the observed position");
    }

    #[test]
    fn disengage_aborts_and_rejects_new_goals() {
        let (mut it, _req_r, _tx, sink) = intake();
        let goal = it.submit(0.02, Some(10.0)).expect("accepted");
        it.disengage();
        assert_eq!(goal.status(), GoalStatus::Aborted);
        assert!(matches!(it.submit(0.0, None), Err(GoalError::NotEngaged)));

        it.engage();
        it.submit(0.0, Some(1.0)).expect("accepted after engage");
        it.dispatch_pending();
        assert_eq!(sink.0.lock().expect("lock").len(), 1);
    }

    #[test]
    fn queue_loss_is_covered_by_the_retained_sweep() {
        // Terminal handle never sent through the queue; the sweep finds it.
        let (mut it, _req_r, _tx, sink) = intake();
        let goal = it.submit(0.02, Some(10.0)).expect("accepted");
        goal.finish(GoalStatus::Succeeded, 0.02, 1.0, true);
        it.dispatch_pending();
        let outs = sink.0.lock().expect("lock");
        assert_eq!(outs.len(), 1);
        assert!(outs[0].stalled);
    }
}
