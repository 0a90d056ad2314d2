//! Reply encoding through a live handle.

use cbridge::{mailbox, BridgeConfig, Handle, MemoryBackend, Reply, Term};
use proptest::prelude::*;

use crate::common::{connect, mget, set};

#[test]
fn delivered_replies_survive_encoding() {
    let handle = Handle::create(MemoryBackend::new(), &BridgeConfig::worker()).unwrap();
    let (issuer, mut replies) = mailbox();

    for (c, args) in [connect(), set("a", "1"), mget(&["a", "missing"])] {
        handle.submit(&issuer, c, args).unwrap();
    }
    handle.destroy().unwrap();

    while let Some(reply) = replies.try_recv() {
        let bytes = reply.encode().unwrap();
        let decoded = Reply::decode(&bytes).unwrap();
        assert_eq!(decoded.is_ok(), reply.is_ok());
        assert_eq!(decoded, reply);
    }
}

#[test]
fn error_reply_keeps_tag() {
    let handle = Handle::create(MemoryBackend::new(), &BridgeConfig::worker()).unwrap();
    let (issuer, mut replies) = mailbox();

    let (c, args) = set("a", "1");
    handle.submit(&issuer, c, args).unwrap();
    let reply = replies.blocking_recv().unwrap();

    let decoded = Reply::decode(&reply.encode().unwrap()).unwrap();
    assert!(!decoded.is_ok());
    assert_eq!(decoded.payload(), &Term::error("not_connected"));
}

proptest! {
    #[test]
    fn arbitrary_argument_lists_never_panic(
        command in -2i64..10,
        ints in prop::collection::vec(any::<i64>(), 0..7),
    ) {
        let handle = Handle::create(MemoryBackend::new(), &BridgeConfig::worker()).unwrap();
        let (issuer, _replies) = mailbox();
        let args: Vec<Term> = ints.into_iter().map(Term::Int).collect();
        let _ = handle.submit(&issuer, command, args);
        handle.destroy().unwrap();
    }
}
