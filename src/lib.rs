//! A small CSP (Communicating Sequential Processes) concurrency kernel:
//! unbuffered rendez-vous [`Channel`]s, a fire-and-forget task [`spawn`],
//! and a fair, atomic multi-way [`select`].
//!
//! This crate gives Go- or Kotlin-style concurrency — synchronous send and
//! receive, non-deterministic choice among several simultaneously-offered
//! operations, an optional default — to a plain host `std` binary running
//! on OS threads. It does not implement a cooperative scheduler; it relies
//! on the OS to run blocked tasks' counterparties concurrently.
//!
//! ```
//! use csp_rt::{select, spawn, Channel, Outcome};
//!
//! let ch = Channel::new();
//! let writer = ch.clone();
//! spawn(move || writer.put(42i32));
//!
//! match select(&[ch.clone()], Vec::new(), false).unwrap() {
//!     Outcome::Recv(_, value) => assert_eq!(*value.downcast::<i32>().unwrap(), 42),
//!     other => panic!("unexpected outcome: {:?}", other),
//! }
//! ```

mod channel;
mod error;
mod select;
mod task;

use std::any::Any;
use std::fmt::{self, Debug, Formatter};

pub use channel::Channel;
pub use error::{Error, Result};
pub use select::select;
pub use task::{spawn, spawn_named, Task, DEFAULT_STACK_SIZE};

/// The opaque payload carried across a rendez-vous. Channels are untyped:
/// a single `select` call may mix channels of unrelated payload types, the
/// way the source system's dynamically-typed channels did. A receiver
/// recovers the concrete type with [`Value::downcast`] or
/// [`Value::downcast_ref`].
pub type Value = Box<dyn Any + Send>;

/// The result of a [`select`] call: which offer won, and what was
/// exchanged.
///
/// This is a Rust-native tagged variant in place of the duck-typed
/// `(channel, value)` tuple a dynamically-typed implementation would
/// return, where `value` might be the payload, `None`, or a sentinel
/// string depending on which case fired.
pub enum Outcome {
    /// A receive offer won: the channel it was offered on, and the value
    /// received.
    Recv(Channel, Value),
    /// A send offer won: the channel it was offered on. The value was
    /// consumed by the rendez-vous; there is nothing further to return.
    Sent(Channel),
    /// No offer was immediately ready and a default clause was supplied.
    Default,
}

impl Debug for Outcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Recv(channel, _) => f
                .debug_tuple("Recv")
                .field(channel)
                .field(&format_args!("<value>"))
                .finish(),
            Outcome::Sent(channel) => f.debug_tuple("Sent").field(channel).finish(),
            Outcome::Default => f.write_str("Default"),
        }
    }
}
