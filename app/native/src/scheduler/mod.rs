//! Recurring background task scheduling.
//!
//! A [`TaskScheduler`] registers at most one recurring task. Each firing
//! carries a [`TriggerId`] which the handler must acknowledge exactly once,
//! including when the firing is a timeout notice.
//!
//! Two implementations are provided:
//!
//! - [`TimerScheduler`] - in-process timer thread with an acknowledgement
//!   budget, used by the long-running daemon
//! - [`DaemonHandoff`] - records the registration for a one-shot process and
//!   leaves the actual firing to the daemon

mod handoff;
mod timer;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub use handoff::DaemonHandoff;
use serde::Serialize;
use thiserror::Error;
pub use timer::TimerScheduler;

/// Identifier of one task firing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TriggerId(String);

impl TriggerId {
    /// Creates a fresh, time-ordered identifier.
    #[must_use]
    pub fn new() -> Self { Self(uuid::Uuid::now_v7().to_string()) }

    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str { &self.0 }
}

impl Default for TriggerId {
    fn default() -> Self { Self::new() }
}

impl From<&str> for TriggerId {
    fn from(value: &str) -> Self { Self(value.to_string()) }
}

impl fmt::Display for TriggerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// Lifecycle flags requested for the recurring task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleFlags {
    /// Keep the schedule after the registering process exits.
    pub persist_across_restart: bool,
    /// Run ticks even when no foreground UI is alive.
    pub run_headless: bool,
    /// Re-establish the schedule after a reboot.
    pub start_on_boot: bool,
}

impl Default for ScheduleFlags {
    fn default() -> Self {
        Self { persist_across_restart: true, run_headless: true, start_on_boot: true }
    }
}

/// Parameters of the recurring task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    /// Minimum interval between firings, in minutes.
    pub interval_minutes: u32,
    /// Lifecycle flags.
    pub flags: ScheduleFlags,
}

impl ScheduleRequest {
    /// Creates a request with default flags.
    #[must_use]
    pub fn every(interval_minutes: u32) -> Self {
        Self { interval_minutes, flags: ScheduleFlags::default() }
    }

    /// Returns the interval as a duration, given the length of one minute.
    #[must_use]
    pub fn period(&self, minute: Duration) -> Duration { minute * self.interval_minutes }
}

/// One firing delivered to the fire handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FireEvent {
    /// Identifier to acknowledge.
    pub trigger: TriggerId,
    /// The scheduler already considers this firing out of time budget.
    pub timed_out: bool,
}

/// Handler invoked for each firing.
pub type FireHandler = Arc<dyn Fn(FireEvent) + Send + Sync>;

/// Handler invoked when a firing exceeds its time budget.
pub type TimeoutHandler = Arc<dyn Fn(TriggerId) + Send + Sync>;

/// Handlers attached to a registration.
#[derive(Clone)]
pub struct TaskHandlers {
    /// Runs the tick.
    pub on_fire: FireHandler,
    /// Finishes a firing that ran out of time.
    pub on_timeout: TimeoutHandler,
}

impl fmt::Debug for TaskHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandlers").finish_non_exhaustive()
    }
}

/// Errors that can occur while talking to the scheduler.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The task could not be registered.
    #[error("failed to register rotation task: {0}")]
    Registration(String),

    /// The task could not be cancelled.
    #[error("failed to cancel rotation task: {0}")]
    Cancel(String),
}

/// Host scheduler holding at most one recurring task.
pub trait TaskScheduler: Send + Sync {
    /// Registers the recurring task, replacing any existing registration.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::Registration` if the host refuses.
    fn register(&self, request: ScheduleRequest, handlers: TaskHandlers) -> Result<(), SchedulerError>;

    /// Cancels the recurring task. Cancelling nothing succeeds.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::Cancel` if the host refuses.
    fn cancel(&self) -> Result<(), SchedulerError>;

    /// Reports that the firing `trigger` is finished.
    fn acknowledge(&self, trigger: &TriggerId);

    /// Returns the live registration, if any.
    fn registration(&self) -> Option<ScheduleRequest>;

    /// Returns whether a task is registered.
    fn is_registered(&self) -> bool { self.registration().is_some() }
}
