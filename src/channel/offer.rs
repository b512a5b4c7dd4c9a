//! A transient intent-to-rendezvous record attached to a channel queue.

use std::sync::Arc;

use parking_lot::Mutex;

use super::group::Group;
use crate::Value;

pub(crate) struct Offer {
    pub(crate) group: Arc<Group>,
    payload: Payload,
}

enum Payload {
    Send(Mutex<Option<Value>>),
    Recv,
}

impl Offer {
    pub(crate) fn new_send(group: Arc<Group>, value: Value) -> Arc<Offer> {
        Arc::new(Offer {
            group,
            payload: Payload::Send(Mutex::new(Some(value))),
        })
    }

    pub(crate) fn new_recv(group: Arc<Group>) -> Arc<Offer> {
        Arc::new(Offer {
            group,
            payload: Payload::Recv,
        })
    }

    /// Takes the value out of a send offer. Panics if called twice, or on a
    /// receive offer; callers only ever take a given send offer's value once
    /// (either to deliver it, or to restore it via [`Offer::restore_value`]
    /// after a failed commit attempt).
    pub(crate) fn take_value(&self) -> Value {
        match &self.payload {
            Payload::Send(slot) => slot
                .lock()
                .take()
                .expect("value already taken from this send offer"),
            Payload::Recv => unreachable!("take_value called on a receive offer"),
        }
    }

    /// Restores a value taken by [`Offer::take_value`] after a commit
    /// attempt against it failed (the counterparty it was matched with had
    /// already committed elsewhere).
    pub(crate) fn restore_value(&self, value: Value) {
        match &self.payload {
            Payload::Send(slot) => {
                let mut guard = slot.lock();
                debug_assert!(guard.is_none(), "restoring a value that was never taken");
                *guard = Some(value);
            }
            Payload::Recv => unreachable!("restore_value called on a receive offer"),
        }
    }
}
