//! Unbuffered rendez-vous channels.
//!
//! A [`Channel`] has no capacity and no closed state: a `put` and a `get`
//! only ever complete together, exchanging one value. At any quiescent
//! moment at least one of its two offer queues is empty (a pending sender
//! and a pending receiver on the same channel must already have
//! rendezvoused).

mod group;
mod offer;

use std::any::Any;
use std::collections::VecDeque;
use std::fmt::{self, Debug, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

pub(crate) use group::Group;
pub(crate) use offer::Offer;

use crate::{Outcome, Value};

static NEXT_CHANNEL_ID: AtomicU64 = AtomicU64::new(1);

/// A handle to an unbuffered rendez-vous channel.
///
/// `Channel` is cheap to clone (it is reference-counted) and every clone
/// refers to the same underlying rendez-vous point; two channels compare
/// equal iff they are handles to the same point, not merely "equivalent"
/// ones.
#[derive(Clone)]
pub struct Channel(Arc<ChannelInner>);

struct ChannelInner {
    id: u64,
    queues: Mutex<Queues>,
}

#[derive(Default)]
struct Queues {
    senders: VecDeque<Arc<Offer>>,
    receivers: VecDeque<Arc<Offer>>,
}

impl Channel {
    /// Creates a fresh, empty rendez-vous channel.
    pub fn new() -> Channel {
        let id = NEXT_CHANNEL_ID.fetch_add(1, Ordering::Relaxed);
        log::trace!("created channel {}", id);
        Channel(Arc::new(ChannelInner {
            id,
            queues: Mutex::new(Queues::default()),
        }))
    }

    /// Blocks until a receiver rendezvouses, then returns. `value` is boxed
    /// as an opaque [`Value`] at the point of the call; later mutation of
    /// the caller's original object (if any) has no effect on what was
    /// sent.
    pub fn put<T: Any + Send + 'static>(&self, value: T) {
        let group = Group::new();
        let offer = Offer::new_send(group.clone(), Box::new(value));

        self.offer_send(&offer);

        group.wait();
        log::debug!("put committed on channel {}", self.0.id);
    }

    /// Blocks until a sender rendezvouses, then returns the delivered value.
    pub fn get(&self) -> Value {
        let group = Group::new();
        let offer = Offer::new_recv(group.clone());

        self.offer_recv(&offer);

        match group.wait() {
            Outcome::Recv(_, value) => {
                log::debug!("get committed on channel {}", self.0.id);
                value
            }
            other => unreachable!("receive offer committed to unexpected outcome: {:?}", other),
        }
    }

    /// Non-blocking pair-or-enqueue for a send offer: under one held lock,
    /// scans the receivers queue for the first eligible (non-committed)
    /// counterparty, discarding stale entries as it goes, and attempts to
    /// commit against it. If no counterparty pairs, enqueues `offer` onto the
    /// senders queue before releasing the lock.
    ///
    /// Scan and enqueue happen under the same critical section deliberately:
    /// splitting them into a scan-then-unlock followed by a separate
    /// re-lock-then-enqueue would open a window in which a counterparty scans
    /// this channel, finds nothing (this offer not yet visible), and leaves —
    /// after which both sides would sit enqueued forever with no one left to
    /// wake either.
    ///
    /// Returns `true` if `offer`'s group committed as a result of this call.
    pub(crate) fn offer_send(&self, offer: &Arc<Offer>) -> bool {
        let mut queues = self.0.queues.lock();
        while let Some(candidate) = queues.receivers.pop_front() {
            if candidate.group.is_committed() {
                continue;
            }

            let value = offer.take_value();
            match Group::try_commit_two(
                &offer.group,
                Outcome::Sent(self.clone()),
                &candidate.group,
                Outcome::Recv(self.clone(), value),
            ) {
                Ok(()) => return true,
                Err((_, counterparty_outcome)) => {
                    offer.restore_value(into_recv_value(counterparty_outcome));
                    // candidate committed elsewhere in the meantime; drop it.
                }
            }
        }
        queues.senders.push_back(offer.clone());
        false
    }

    /// Symmetric to [`Channel::offer_send`], scanning the senders queue and
    /// enqueuing onto the receivers queue under the same lock on failure.
    pub(crate) fn offer_recv(&self, offer: &Arc<Offer>) -> bool {
        let mut queues = self.0.queues.lock();
        while let Some(candidate) = queues.senders.pop_front() {
            if candidate.group.is_committed() {
                continue;
            }

            let value = candidate.take_value();
            match Group::try_commit_two(
                &candidate.group,
                Outcome::Sent(self.clone()),
                &offer.group,
                Outcome::Recv(self.clone(), value),
            ) {
                Ok(()) => return true,
                Err((_, recv_outcome)) => {
                    candidate.restore_value(into_recv_value(recv_outcome));
                    // candidate (the sender) committed elsewhere; drop it.
                }
            }
        }
        queues.receivers.push_back(offer.clone());
        false
    }

    /// Removes `offer` from this channel's send queue, if still present.
    /// A no-op if it was already removed (consumed by a rendezvous, or
    /// never enqueued because a fast scan already won).
    pub(crate) fn withdraw_send(&self, offer: &Arc<Offer>) {
        self.0
            .queues
            .lock()
            .senders
            .retain(|queued| !Arc::ptr_eq(queued, offer));
    }

    /// Symmetric to [`Channel::withdraw_send`] for the receive queue.
    pub(crate) fn withdraw_recv(&self, offer: &Arc<Offer>) {
        self.0
            .queues
            .lock()
            .receivers
            .retain(|queued| !Arc::ptr_eq(queued, offer));
    }
}

impl Default for Channel {
    fn default() -> Self {
        Channel::new()
    }
}

impl Debug for Channel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel").field("id", &self.0.id).finish()
    }
}

impl PartialEq for Channel {
    fn eq(&self, other: &Self) -> bool {
        by_address::ByAddress(self.0.clone()) == by_address::ByAddress(other.0.clone())
    }
}

impl Eq for Channel {}

impl std::hash::Hash for Channel {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        by_address::ByAddress(self.0.clone()).hash(state)
    }
}

/// Recovers the boxed value from an `Outcome::Recv` handed back by a failed
/// commit attempt, so it can be restored to the send offer that owned it.
fn into_recv_value(outcome: Outcome) -> Value {
    match outcome {
        Outcome::Recv(_, value) => value,
        other => unreachable!("expected a Recv outcome to recover a value from, got {:?}", other),
    }
}
