//! Worker strategy scenarios.

use std::sync::Arc;
use std::time::{Duration, Instant};

use cbridge::{
    mailbox, Backend, BridgeConfig, Error, Handle, HandleState, MemoryBackend, Reply, Term,
};

use crate::common::{assert_no_overlap, connect, mget, set, SlowBackend};

#[test]
fn store_with_delayed_backend_replies_later() {
    let (backend, log) = SlowBackend::new(Duration::from_millis(50));
    let handle = Handle::create(backend, &BridgeConfig::worker()).unwrap();
    let (issuer, mut replies) = mailbox();

    let (c, args) = connect();
    handle.submit(&issuer, c, args).unwrap();

    // Submission returns before the backend finishes.
    let started = Instant::now();
    let (c, args) = set("k", "v");
    handle.submit(&issuer, c, args).unwrap();
    assert!(started.elapsed() < Duration::from_millis(50));

    assert_eq!(replies.blocking_recv(), Some(Reply::Ok(Term::ok())));
    match replies.blocking_recv() {
        Some(Reply::Ok(Term::Tuple(items))) => {
            assert_eq!(items[0], Term::ok());
            assert!(items[1].as_int().unwrap() > 0);
        }
        other => panic!("expected {{ok, Cas}}, got {:?}", other),
    }

    handle.destroy().unwrap();
    assert_eq!(log.lock().len(), 2);
}

#[test]
fn wrong_arity_store_rejected_synchronously() {
    let (backend, log) = SlowBackend::new(Duration::ZERO);
    let handle = Handle::create(backend, &BridgeConfig::worker()).unwrap();
    let (issuer, mut replies) = mailbox();

    let (c, mut args) = set("k", "v");
    args.truncate(3);
    let err = handle.submit(&issuer, c, args).unwrap_err();
    assert!(matches!(err, Error::ParseError { .. }));
    assert_eq!(err.to_term(), Term::atom("badarg"));

    handle.destroy().unwrap();
    assert_eq!(replies.try_recv(), None);
    assert!(log.lock().is_empty());
}

#[test]
fn undefined_command_ids_rejected() {
    let (backend, _) = SlowBackend::new(Duration::ZERO);
    let handle = Handle::create(backend, &BridgeConfig::worker()).unwrap();
    let (issuer, mut replies) = mailbox();

    for raw in [99, -1] {
        assert_eq!(
            handle.submit(&issuer, raw, vec![]).unwrap_err(),
            Error::InvalidCommand { command: raw }
        );
    }
    handle.destroy().unwrap();
    assert_eq!(replies.try_recv(), None);
}

#[test]
fn three_rapid_submissions_delivered_before_destroy_returns() {
    let (backend, log) = SlowBackend::new(Duration::from_millis(20));
    let handle = Handle::create(backend, &BridgeConfig::worker()).unwrap();
    let (issuer, mut replies) = mailbox();

    let (c, args) = connect();
    handle.submit(&issuer, c, args).unwrap();
    let (c, args) = set("a", "1");
    handle.submit(&issuer, c, args).unwrap();
    let (c, args) = mget(&["a"]);
    handle.submit(&issuer, c, args).unwrap();

    handle.destroy().unwrap();
    assert_eq!(handle.state(), HandleState::Destroyed);

    let delivered: Vec<_> = std::iter::from_fn(|| replies.try_recv()).collect();
    assert_eq!(delivered.len(), 3);
    assert!(delivered.iter().all(Reply::is_ok));

    let ops: Vec<_> = log.lock().iter().map(|(op, _, _)| *op).collect();
    assert_eq!(ops, vec!["connect", "store", "mget"]);
}

#[test]
fn many_issuers_share_one_worker() {
    let (backend, log) = SlowBackend::new(Duration::from_millis(1));
    let handle = Arc::new(Handle::create(backend, &BridgeConfig::worker()).unwrap());

    let (c, args) = connect();
    let (issuer, mut replies) = mailbox();
    handle.submit(&issuer, c, args).unwrap();
    assert!(replies.blocking_recv().unwrap().is_ok());

    let threads: Vec<_> = (0..4)
        .map(|t| {
            let handle = Arc::clone(&handle);
            std::thread::spawn(move || {
                let (issuer, mut replies) = mailbox();
                for i in 0..5 {
                    let (c, args) = set(&format!("t{}-{}", t, i), "v");
                    handle.submit(&issuer, c, args).unwrap();
                }
                // Each issuer receives only its own replies.
                (0..5)
                    .map(|_| replies.blocking_recv().unwrap())
                    .filter(Reply::is_ok)
                    .count()
            })
        })
        .collect();

    let ok: usize = threads.into_iter().map(|t| t.join().unwrap()).sum();
    assert_eq!(ok, 20);

    handle.destroy().unwrap();
    assert_no_overlap(&log);
}

#[test]
fn boxed_backend_serves_requests() {
    let backend: Box<dyn Backend> = Box::new(MemoryBackend::new());
    let handle = Handle::create(backend, &BridgeConfig::worker()).unwrap();
    let (issuer, mut replies) = mailbox();

    for (c, args) in [connect(), set("k", "v"), mget(&["k"])] {
        handle.submit(&issuer, c, args).unwrap();
    }
    for _ in 0..3 {
        let reply = replies.blocking_recv().unwrap();
        assert!(reply.is_ok(), "unexpected reply {:?}", reply);
    }

    handle.destroy().unwrap();
}
