//! The shared commit state of one `put`/`get`/`select` call.
//!
//! A [`Group`] is the CSP "group" from the data model: every offer issued by
//! a single call shares one, and its commit lock is what makes at-most-one
//! of them ever win. A direct `put`/`get` uses a singleton group containing
//! exactly one offer; `select` uses one group shared by every offer in the
//! call.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::Outcome;

static NEXT_GROUP_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) struct Group {
    pub(crate) id: u64,
    state: Mutex<GroupState>,
    wake: Condvar,
}

struct GroupState {
    committed: bool,
    outcome: Option<Outcome>,
}

impl Group {
    pub(crate) fn new() -> Arc<Group> {
        let id = NEXT_GROUP_ID.fetch_add(1, Ordering::Relaxed);
        Arc::new(Group {
            id,
            state: Mutex::new(GroupState {
                committed: false,
                outcome: None,
            }),
            wake: Condvar::new(),
        })
    }

    /// Whether this group has already committed. Cheap relative to a full
    /// cross-group commit attempt; used to skip stale queue entries.
    pub(crate) fn is_committed(&self) -> bool {
        self.state.lock().committed
    }

    /// Commits this group, alone, to `outcome` — used for the synthetic
    /// default case. Unlike [`Group::try_commit_two`] this never moves a
    /// second group, so a plain compare-and-set under the lock suffices;
    /// the caller may still lose the race if a counterparty committed this
    /// same group to a real outcome first, in which case this simply
    /// returns `false`.
    pub(crate) fn try_commit(&self, outcome: Outcome) -> bool {
        let mut state = self.state.lock();
        if state.committed {
            return false;
        }
        state.committed = true;
        state.outcome = Some(outcome);
        drop(state);
        self.wake.notify_all();
        true
    }

    /// Attempts to commit two distinct groups together, as the two sides of
    /// a rendezvous. Locks both groups' commit locks in ascending `id` order
    /// to avoid deadlock against a concurrent attempt that also holds both.
    ///
    /// On success, both groups are marked committed with their respective
    /// outcome and both wake handles are signaled. On failure (either group
    /// had already committed elsewhere), the outcomes are handed back
    /// unchanged so the caller can recover any payload it moved into them.
    pub(crate) fn try_commit_two(
        a: &Arc<Group>,
        a_outcome: Outcome,
        b: &Arc<Group>,
        b_outcome: Outcome,
    ) -> Result<(), (Outcome, Outcome)> {
        if Arc::ptr_eq(a, b) {
            // An offer can never rendezvous with another offer from its own
            // group; that would violate at-most-one-commit.
            return Err((a_outcome, b_outcome));
        }

        let a_is_first = a.id < b.id;
        let (first, second) = if a_is_first { (a, b) } else { (b, a) };

        let mut first_state = first.state.lock();
        if first_state.committed {
            return Err((a_outcome, b_outcome));
        }
        let mut second_state = second.state.lock();
        if second_state.committed {
            return Err((a_outcome, b_outcome));
        }

        let (first_outcome, second_outcome) = if a_is_first {
            (a_outcome, b_outcome)
        } else {
            (b_outcome, a_outcome)
        };

        first_state.committed = true;
        first_state.outcome = Some(first_outcome);
        second_state.committed = true;
        second_state.outcome = Some(second_outcome);

        drop(second_state);
        drop(first_state);

        first.wake.notify_all();
        second.wake.notify_all();

        log::trace!("committed groups {} and {}", first.id, second.id);

        Ok(())
    }

    /// Blocks until this group has committed, then returns the outcome
    /// recorded for it. If the group already committed (e.g. a fast scan
    /// already won), returns immediately without sleeping.
    pub(crate) fn wait(&self) -> Outcome {
        let mut state = self.state.lock();
        while !state.committed {
            self.wake.wait(&mut state);
        }
        state
            .outcome
            .take()
            .expect("group committed without recording an outcome")
    }
}
