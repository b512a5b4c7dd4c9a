//! Task runtime: spawns user procedures as independent threads of control.
//!
//! The channel rendezvous protocol requires that a blocked `put` and a
//! blocked `get` run on distinct threads of control so each can observe the
//! other's wake signal. This module backs tasks with real OS threads, so the
//! host scheduler guarantees forward progress without any cooperative yield
//! point.

use std::fmt::{self, Debug, Formatter};
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use crate::error::{Error, Result};

/// Default stack size for a spawned task, in bytes.
///
/// Mirrors the notion of a configurable stack depth from embedded RTOS task
/// APIs, scaled to a sensible host default.
pub const DEFAULT_STACK_SIZE: usize = 2 * 1024 * 1024;

/// A handle to a spawned task.
///
/// Opaque to users beyond introspection: there is no join handle in the CSP
/// sense (the spawner does not wait on it, and a panic inside the task does
/// not propagate here). Dropping a `Task` does not stop the underlying
/// thread; it detaches, matching fire-and-forget spawn semantics.
pub struct Task {
    name: String,
    handle: Option<JoinHandle<()>>,
}

impl Task {
    /// The name given to this task at spawn time.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` once the task's underlying thread has run to
    /// completion (or panicked).
    pub fn is_finished(&self) -> bool {
        match &self.handle {
            Some(handle) => handle.is_finished(),
            None => true,
        }
    }
}

impl Debug for Task {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").field("name", &self.name).finish()
    }
}

impl Drop for Task {
    fn drop(&mut self) {
        // Detach: a dropped JoinHandle lets the thread keep running.
        self.handle.take();
    }
}

/// Spawns `f` to run concurrently with the caller, using a default name and
/// [`DEFAULT_STACK_SIZE`]. Panics if the OS refuses to create the thread; see
/// [`spawn_named`] for a fallible variant.
pub fn spawn<F>(f: F) -> Task
where
    F: FnOnce() + Send + 'static,
{
    spawn_named("csp-rt-task", DEFAULT_STACK_SIZE, f)
        .unwrap_or_else(|err| panic!("failed to spawn task: {}", err))
}

/// Spawns `f` to run concurrently with the caller, with an explicit thread
/// name and stack size.
///
/// An unhandled panic inside `f` is caught at the thread boundary, logged at
/// `error` level, and does not propagate to the spawner or disturb other
/// tasks. Channel offers made by a task that subsequently panics simply
/// never commit; they are observed by counterparties as ineligible.
pub fn spawn_named<F>(name: &str, stack_size: usize, f: F) -> Result<Task>
where
    F: FnOnce() + Send + 'static,
{
    let task_name = name.to_owned();
    let log_name = task_name.clone();

    log::trace!("spawning task {:?}", task_name);

    let handle = thread::Builder::new()
        .name(task_name)
        .stack_size(stack_size)
        .spawn(move || {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(f)) {
                let message = panic_message(&payload);
                log::error!("task {:?} panicked: {}", log_name, message);
            }
        })
        .map_err(Error::Spawn)?;

    Ok(Task {
        name: name.to_owned(),
        handle: Some(handle),
    })
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic payload>"
    }
}
