//! End-to-end scenarios mirroring the reference implementation's own test
//! suite (see `examples/original_source/tests/select_tests.py` in the
//! retrieval pack this crate was built against). Each test asserts on the
//! set of outcomes the algorithm guarantees, rather than depending on any
//! particular thread interleaving.

use std::sync::mpsc;
use std::time::{Duration, Instant};

use csp_rt::{select, spawn, Channel, Outcome};

fn recv_i32(outcome: Outcome) -> (Channel, i32) {
    match outcome {
        Outcome::Recv(channel, value) => (channel, *value.downcast::<i32>().unwrap()),
        other => panic!("expected Recv, got {:?}", other),
    }
}

/// Scenario 1: delayed receive. A task sleeps, then sends; `select` on the
/// lone channel must block until that happens and return promptly after.
#[test]
fn delayed_receive() {
    let ch1 = Channel::new();
    let writer = ch1.clone();
    spawn(move || {
        std::thread::sleep(Duration::from_secs(1));
        writer.put(42i32);
    });

    let start = Instant::now();
    let outcome = select(&[ch1.clone()], Vec::new(), false).unwrap();
    let elapsed = start.elapsed();

    let (channel, value) = recv_i32(outcome);
    assert_eq!(channel, ch1);
    assert_eq!(value, 42);
    assert!(elapsed >= Duration::from_millis(950), "elapsed = {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(1500), "elapsed = {:?}", elapsed);
}

/// Scenario 2: a default-polling loop eventually observes the real send.
#[test]
fn default_loop_eventually_receives() {
    let ch1 = Channel::new();
    let ch2 = Channel::new();

    let writer_ch1 = ch1.clone();
    let waiter_ch2 = ch2.clone();
    spawn(move || {
        waiter_ch2.get();
        writer_ch1.put(42i32);
    });

    let mut default_count = 0;
    let mut sent_to_ch2 = false;
    loop {
        match select(&[ch1.clone()], Vec::new(), true).unwrap() {
            Outcome::Recv(channel, value) => {
                assert_eq!(channel, ch1);
                assert_eq!(*value.downcast::<i32>().unwrap(), 42);
                break;
            }
            Outcome::Default => {
                default_count += 1;
                if !sent_to_ch2 {
                    ch2.put(1i32);
                    sent_to_ch2 = true;
                }
            }
            Outcome::Sent(_) => unreachable!("no send offers were made"),
        }
        assert!(default_count < 1_000_000, "select never became ready");
    }
    assert!(default_count >= 1);
}

/// Scenario 3: two ready receives, no default — exactly one wins, and the
/// other is still drainable afterward.
#[test]
fn two_receives_no_default() {
    let ch1 = Channel::new();
    let ch2 = Channel::new();

    let w1 = ch1.clone();
    spawn(move || w1.put(42i32));
    let w2 = ch2.clone();
    spawn(move || w2.put(51i32));

    std::thread::sleep(Duration::from_millis(100));

    let outcome = select(&[ch1.clone(), ch2.clone()], Vec::new(), false).unwrap();
    let (channel, value) = recv_i32(outcome);

    if channel == ch1 {
        assert_eq!(value, 42);
        assert_eq!(*ch2.get().downcast::<i32>().unwrap(), 51);
    } else {
        assert_eq!(channel, ch2);
        assert_eq!(value, 51);
        assert_eq!(*ch1.get().downcast::<i32>().unwrap(), 42);
    }
}

/// Scenario 4: a receive offer and a send offer race against a default
/// clause; since both counterparties are already waiting, neither the
/// default is chosen.
#[test]
fn mixed_send_receive_with_default() {
    let ch1 = Channel::new();
    let ch2 = Channel::new();

    let writer = ch1.clone();
    spawn(move || writer.put(42i32));

    let reader = ch2.clone();
    let forward = ch1.clone();
    spawn(move || {
        let x = reader.get();
        forward.put(*x.downcast::<i32>().unwrap());
    });

    std::thread::sleep(Duration::from_millis(100));

    let outcome = select(&[ch1.clone()], vec![(ch2.clone(), Box::new(51i32))], true).unwrap();
    match outcome {
        Outcome::Recv(channel, value) => {
            assert_eq!(channel, ch1);
            assert_eq!(*value.downcast::<i32>().unwrap(), 42);
        }
        Outcome::Sent(channel) => {
            assert_eq!(channel, ch2);
        }
        Outcome::Default => panic!("default should not have been selected"),
    }
}

/// Scenario 5: two send offers, no default — exactly one commits, and the
/// other's value is still available to send afterward.
#[test]
fn two_sends_no_default() {
    let ch1a = Channel::new();
    let ch1b = Channel::new();
    let ch2a = Channel::new();
    let ch2b = Channel::new();

    let r1a = ch1a.clone();
    let w1b = ch1b.clone();
    spawn(move || {
        let x = r1a.get();
        w1b.put(*x.downcast::<i32>().unwrap());
    });

    let r2a = ch2a.clone();
    let w2b = ch2b.clone();
    spawn(move || {
        let x = r2a.get();
        w2b.put(*x.downcast::<i32>().unwrap());
    });

    std::thread::sleep(Duration::from_millis(100));

    let outcome = select(
        &[],
        vec![(ch1a.clone(), Box::new(42i32)), (ch2a.clone(), Box::new(51i32))],
        false,
    )
    .unwrap();

    match outcome {
        Outcome::Sent(channel) if channel == ch1a => {
            assert_eq!(*ch1b.get().downcast::<i32>().unwrap(), 42);
            ch2a.put(17i32);
            assert_eq!(*ch2b.get().downcast::<i32>().unwrap(), 17);
        }
        Outcome::Sent(channel) if channel == ch2a => {
            assert_eq!(*ch2b.get().downcast::<i32>().unwrap(), 51);
            ch1a.put(17i32);
            assert_eq!(*ch1b.get().downcast::<i32>().unwrap(), 17);
        }
        other => panic!("expected a Sent outcome on ch1a or ch2a, got {:?}", other),
    }
}

/// Scenario 6: an empty select with no default is rejected immediately.
#[test]
fn empty_select_is_rejected() {
    let err = select(&[], Vec::new(), false).unwrap_err();
    assert!(matches!(err, csp_rt::Error::EmptySelect));
}

/// Supplemented from the reference test suite: two simultaneous send
/// offers racing with a default clause present still prefer the ready
/// sends over the default.
#[test]
fn two_sends_with_default_prefers_ready_sends() {
    let ch1a = Channel::new();
    let ch1b = Channel::new();
    let ch2a = Channel::new();
    let ch2b = Channel::new();

    let r1a = ch1a.clone();
    let w1b = ch1b.clone();
    spawn(move || {
        let x = r1a.get();
        w1b.put(*x.downcast::<i32>().unwrap());
    });

    let r2a = ch2a.clone();
    let w2b = ch2b.clone();
    spawn(move || {
        let x = r2a.get();
        w2b.put(*x.downcast::<i32>().unwrap());
    });

    std::thread::sleep(Duration::from_millis(100));

    let outcome = select(
        &[],
        vec![(ch1a.clone(), Box::new(42i32)), (ch2a.clone(), Box::new(51i32))],
        true,
    )
    .unwrap();

    match outcome {
        Outcome::Sent(channel) if channel == ch1a => {
            assert_eq!(*ch1b.get().downcast::<i32>().unwrap(), 42);
        }
        Outcome::Sent(channel) if channel == ch2a => {
            assert_eq!(*ch2b.get().downcast::<i32>().unwrap(), 51);
        }
        other => panic!("expected a Sent outcome, got {:?}", other),
    }
}

/// A blocked `get` and a `select` racing on the same channel must still
/// agree on at most one winner, and the loser must observe the other side
/// of the channel cleanly.
#[test]
fn select_and_direct_get_compete_fairly() {
    let ch = Channel::new();
    let (tx, rx) = mpsc::channel();

    let sender = ch.clone();
    spawn(move || sender.put(7i32));

    let direct = ch.clone();
    let tx2 = tx.clone();
    spawn(move || {
        let value = *direct.get().downcast::<i32>().unwrap();
        tx2.send(("direct", value)).unwrap();
    });

    std::thread::sleep(Duration::from_millis(50));
    if let Ok(outcome) = select(&[ch.clone()], Vec::new(), true) {
        if let Outcome::Recv(_, value) = outcome {
            tx.send(("select", *value.downcast::<i32>().unwrap())).unwrap();
        }
    }

    let (who, value) = rx.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(value, 7);
    assert!(who == "direct" || who == "select");
}
