//! Dirty offload strategy.

use std::sync::Arc;
use std::time::Duration;

use cbridge::{BridgeConfig, Handle, HandleState, Reply, Term};

use crate::common::{assert_no_overlap, connect, mget, set, SlowBackend};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_calls_are_serialized_in_backend() {
    let (backend, log) = SlowBackend::new(Duration::from_millis(5));
    let handle = Arc::new(Handle::create(backend, &BridgeConfig::dirty()).unwrap());

    let (c, args) = connect();
    assert_eq!(handle.call(c, args).await, Reply::Ok(Term::ok()));

    let calls: Vec<_> = (0..8)
        .map(|i| {
            let handle = Arc::clone(&handle);
            tokio::spawn(async move {
                let (c, args) = set(&format!("k{}", i), "v");
                handle.call(c, args).await
            })
        })
        .collect();
    for call in calls {
        assert!(call.await.unwrap().is_ok());
    }

    assert_eq!(log.lock().len(), 9);
    assert_no_overlap(&log);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn call_surfaces_rejections_as_badarg() {
    let (backend, log) = SlowBackend::new(Duration::ZERO);
    let handle = Handle::create(backend, &BridgeConfig::dirty()).unwrap();

    let (c, mut args) = mget(&["a"]);
    args.pop();
    assert_eq!(handle.call(c, args).await, Reply::Error(Term::atom("badarg")));
    assert!(log.lock().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn destroy_waits_for_in_flight_work() {
    let (backend, log) = SlowBackend::new(Duration::from_millis(30));
    let handle = Arc::new(Handle::create(backend, &BridgeConfig::dirty()).unwrap());

    let pending: Vec<_> = (0..3)
        .map(|_| {
            let handle = Arc::clone(&handle);
            tokio::spawn(async move {
                let (c, args) = connect();
                handle.call(c, args).await
            })
        })
        .collect();

    // Let every call pass admission before tearing down.
    tokio::time::sleep(Duration::from_millis(10)).await;

    let h = Arc::clone(&handle);
    tokio::task::spawn_blocking(move || h.destroy().unwrap())
        .await
        .unwrap();
    assert_eq!(handle.state(), HandleState::Destroyed);
    assert_eq!(log.lock().len(), 3);

    for call in pending {
        assert_eq!(call.await.unwrap(), Reply::Ok(Term::ok()));
    }
}
