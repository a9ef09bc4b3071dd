//! In-process recurring timer.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use super::{
    FireEvent, ScheduleRequest, SchedulerError, TaskHandlers, TaskScheduler, TriggerId,
};
use crate::platform::thread::spawn_named_thread;

const MINUTE: Duration = Duration::from_secs(60);

#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    registration: Option<ScheduleRequest>,
}

#[derive(Debug, Default)]
struct Shared {
    slot: Mutex<Slot>,
    wake: Condvar,
    pending: Mutex<HashMap<TriggerId, Sender<()>>>,
    busy: AtomicBool,
}

/// Clears the busy flag when the tick worker finishes or fails to start.
struct BusyGuard(Arc<Shared>);

impl Drop for BusyGuard {
    fn drop(&mut self) { self.0.busy.store(false, Ordering::SeqCst); }
}

/// Fires the registered task from a background thread.
///
/// Each firing runs the fire handler on its own worker thread and waits up to
/// the acknowledgement budget. A firing that is not acknowledged in time is
/// handed to the timeout handler. If the previous tick is still running when
/// the next one is due, the new firing is delivered already timed out.
#[derive(Debug)]
pub struct TimerScheduler {
    minute: Duration,
    ack_timeout: Duration,
    shared: Arc<Shared>,
}

impl TimerScheduler {
    /// Creates a scheduler with the given acknowledgement budget.
    #[must_use]
    pub fn new(ack_timeout: Duration) -> Self {
        Self { minute: MINUTE, ack_timeout, shared: Arc::new(Shared::default()) }
    }

    /// Overrides the length of one interval minute.
    #[must_use]
    pub fn with_minute(mut self, minute: Duration) -> Self {
        self.minute = minute;
        self
    }

    fn bump_generation(&self, registration: Option<ScheduleRequest>) -> u64 {
        let mut slot = self.shared.slot.lock();
        slot.generation += 1;
        slot.registration = registration;
        let generation = slot.generation;
        drop(slot);
        self.shared.wake.notify_all();
        generation
    }
}

impl TaskScheduler for TimerScheduler {
    fn register(&self, request: ScheduleRequest, handlers: TaskHandlers) -> Result<(), SchedulerError> {
        if request.interval_minutes == 0 {
            return Err(SchedulerError::Registration("interval must be positive".to_string()));
        }

        let generation = self.bump_generation(Some(request));
        let shared = Arc::clone(&self.shared);
        let period = request.period(self.minute);
        let ack_timeout = self.ack_timeout;

        spawn_named_thread("timer", move || run_timer(&shared, generation, period, ack_timeout, &handlers));

        tracing::info!(interval_minutes = request.interval_minutes, "rotation timer registered");
        Ok(())
    }

    fn cancel(&self) -> Result<(), SchedulerError> {
        let was_registered = self.registration().is_some();
        self.bump_generation(None);
        if was_registered {
            tracing::info!("rotation timer cancelled");
        }
        Ok(())
    }

    fn acknowledge(&self, trigger: &TriggerId) {
        let sender = self.shared.pending.lock().remove(trigger);
        match sender {
            Some(tx) => {
                let _ = tx.send(());
            }
            None => tracing::debug!(%trigger, "acknowledged unknown or expired trigger"),
        }
    }

    fn registration(&self) -> Option<ScheduleRequest> { self.shared.slot.lock().registration }
}

impl Drop for TimerScheduler {
    fn drop(&mut self) { self.bump_generation(None); }
}

fn run_timer(
    shared: &Arc<Shared>,
    generation: u64,
    period: Duration,
    ack_timeout: Duration,
    handlers: &TaskHandlers,
) {
    loop {
        {
            let mut slot = shared.slot.lock();
            let deadline = Instant::now() + period;
            while slot.generation == generation {
                if shared.wake.wait_until(&mut slot, deadline).timed_out() {
                    break;
                }
            }
            if slot.generation != generation {
                tracing::trace!(generation, "rotation timer superseded");
                return;
            }
        }

        fire(shared, handlers, ack_timeout);
    }
}

fn fire(shared: &Arc<Shared>, handlers: &TaskHandlers, ack_timeout: Duration) {
    let trigger = TriggerId::new();
    let (tx, rx) = mpsc::channel();
    shared.pending.lock().insert(trigger.clone(), tx);

    let timed_out = shared.busy.swap(true, Ordering::SeqCst);
    let event = FireEvent { trigger: trigger.clone(), timed_out };

    if timed_out {
        tracing::warn!(%trigger, "previous tick still running, delivering firing as timed out");
        (handlers.on_fire)(event);
    } else {
        let guard = BusyGuard(Arc::clone(shared));
        let on_fire = Arc::clone(&handlers.on_fire);
        spawn_named_thread("tick", move || {
            let _guard = guard;
            on_fire(event);
        });
    }

    if rx.recv_timeout(ack_timeout).is_ok() {
        tracing::trace!(%trigger, "tick acknowledged");
        return;
    }

    shared.pending.lock().remove(&trigger);
    tracing::warn!(%trigger, budget = ?ack_timeout, "tick exceeded its time budget");
    (handlers.on_timeout)(trigger);
}
