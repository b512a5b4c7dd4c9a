//! Multi-way select: atomically commits to exactly one of several
//! simultaneously-offered channel operations.

use std::sync::Arc;

use rand::seq::SliceRandom;

use crate::channel::{Channel, Group, Offer};
use crate::error::{Error, Result};
use crate::{Outcome, Value};

struct RecvEntry {
    channel: Channel,
    offer: Arc<Offer>,
}

struct SendEntry {
    channel: Channel,
    offer: Arc<Offer>,
}

enum ScanTarget {
    Recv(usize),
    Send(usize),
}

/// Offers a set of receives and sends, and atomically commits to exactly
/// one of them.
///
/// `receives` is the set of channels offered for receiving; `sends` is the
/// set of `(channel, value)` pairs offered for sending (owned, since a send
/// offer must take ownership of the value it might transmit). If `default`
/// is `true` and no offer can be satisfied immediately, [`Outcome::Default`]
/// is returned instead of blocking.
///
/// Fails with [`Error::EmptySelect`] if `receives` and `sends` are both
/// empty and `default` is `false` — such a call could never wake up.
pub fn select(receives: &[Channel], sends: Vec<(Channel, Value)>, default: bool) -> Result<Outcome> {
    if receives.is_empty() && sends.is_empty() && !default {
        return Err(Error::EmptySelect);
    }

    let group = Group::new();

    let recv_entries: Vec<RecvEntry> = receives
        .iter()
        .map(|channel| RecvEntry {
            channel: channel.clone(),
            offer: Offer::new_recv(group.clone()),
        })
        .collect();

    let send_entries: Vec<SendEntry> = sends
        .into_iter()
        .map(|(channel, value)| SendEntry {
            channel,
            offer: Offer::new_send(group.clone(), value),
        })
        .collect();

    // Fast scan, in uniformly random order: no offer is statically preferred
    // over another. Each step is a single atomic pair-or-enqueue call on its
    // channel (`Channel::offer_recv`/`offer_send`), never a separate scan
    // followed later by a separate enqueue — splitting those would leave a
    // window in which a counterparty scans the channel before this offer is
    // visible there, finds nothing, and leaves, after which neither side
    // would ever be woken.
    let mut order: Vec<ScanTarget> = (0..recv_entries.len())
        .map(ScanTarget::Recv)
        .chain((0..send_entries.len()).map(ScanTarget::Send))
        .collect();
    order.shuffle(&mut rand::thread_rng());

    for target in &order {
        if group.is_committed() {
            break;
        }
        match target {
            ScanTarget::Recv(i) => {
                let entry = &recv_entries[*i];
                entry.channel.offer_recv(&entry.offer);
            }
            ScanTarget::Send(i) => {
                let entry = &send_entries[*i];
                entry.channel.offer_send(&entry.offer);
            }
        }
    }

    // Any offer that failed to pair above is now enqueued on its channel. If
    // nothing committed and a default clause was supplied, try to claim the
    // group for `Default` — this can lose a race to a counterparty that
    // rendezvouses with one of those just-enqueued offers in the meantime,
    // in which case that real outcome wins instead, which is always a
    // legitimate answer to give back.
    if default && !group.is_committed() && group.try_commit(Outcome::Default) {
        log::trace!("select resolved to default");
    }

    let outcome = group.wait();

    // Withdraw every offer that did not win: a no-op for an offer whose
    // pair-or-enqueue call itself won the group, and a no-op for one a
    // counterparty already dequeued on commit. Otherwise removes an offer
    // left sitting on its channel — including one that briefly wasn't needed
    // because a default outcome was claimed instead.
    for entry in &recv_entries {
        entry.channel.withdraw_recv(&entry.offer);
    }
    for entry in &send_entries {
        entry.channel.withdraw_send(&entry.offer);
    }

    log::debug!("select resolved to {:?}", outcome);

    Ok(outcome)
}
