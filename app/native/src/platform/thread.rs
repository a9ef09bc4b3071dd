//! Named background threads.

use std::thread;

/// Spawns a detached thread named `wallcycle-{name}`.
///
/// A failure to spawn is logged; the task is dropped without running.
pub fn spawn_named_thread<F>(name: &str, task: F)
where F: FnOnce() + Send + 'static {
    let thread_name = format!("wallcycle-{name}");

    if let Err(err) = thread::Builder::new().name(thread_name.clone()).spawn(task) {
        tracing::error!(thread = %thread_name, error = %err, "failed to spawn thread");
    }
}
