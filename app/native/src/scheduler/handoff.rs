//! Scheduler stand-in for one-shot processes.

use parking_lot::Mutex;

use super::{ScheduleRequest, SchedulerError, TaskHandlers, TaskScheduler, TriggerId};

/// Records the registration and leaves firing to the daemon.
///
/// A CLI invocation exits right after persisting its change, so it cannot
/// host a timer itself. The daemon watches the persisted record and
/// reconciles its own [`TimerScheduler`](super::TimerScheduler) with it.
#[derive(Debug, Default)]
pub struct DaemonHandoff {
    registration: Mutex<Option<ScheduleRequest>>,
}

impl DaemonHandoff {
    /// Creates a handoff that starts with `registration`, usually derived from
    /// the persisted `taskRegistered` flag.
    #[must_use]
    pub const fn new(registration: Option<ScheduleRequest>) -> Self {
        Self { registration: Mutex::new(registration) }
    }
}

impl TaskScheduler for DaemonHandoff {
    fn register(&self, request: ScheduleRequest, _handlers: TaskHandlers) -> Result<(), SchedulerError> {
        *self.registration.lock() = Some(request);
        tracing::debug!(interval_minutes = request.interval_minutes, "rotation handed off to daemon");
        Ok(())
    }

    fn cancel(&self) -> Result<(), SchedulerError> {
        *self.registration.lock() = None;
        tracing::debug!("rotation cancellation handed off to daemon");
        Ok(())
    }

    fn acknowledge(&self, trigger: &TriggerId) {
        tracing::trace!(%trigger, "manual tick finished");
    }

    fn registration(&self) -> Option<ScheduleRequest> { *self.registration.lock() }
}
