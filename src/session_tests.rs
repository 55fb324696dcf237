// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn new_session_assigns_distinct_ids() {
    let (a, _rx_a) = Session::new(Identity::anonymous());
    let (b, _rx_b) = Session::new(Identity::anonymous());
    assert_ne!(a.id, b.id);
}

#[test]
fn send_enqueues_and_receiver_observes_it() {
    let (session, mut rx) = Session::new(Identity::anonymous());
    assert!(session.send(Arc::from("hello")));
    assert_eq!(rx.try_recv().as_deref(), Ok("hello"));
}

#[test]
fn send_force_closes_on_full_queue() {
    let (session, _rx) = Session::new(Identity::anonymous());
    for _ in 0..OUTBOUND_CAPACITY {
        assert!(session.send(Arc::from("x")));
    }
    assert!(!session.send(Arc::from("overflow")));
    assert!(session.cancel_token().is_cancelled());
}

#[test]
fn close_drops_sender_so_receiver_drains_then_closes() {
    let (session, mut rx) = Session::new(Identity::anonymous());
    assert!(session.send(Arc::from("buffered")));
    session.close();
    assert!(!session.send(Arc::from("too-late")));
    assert_eq!(rx.try_recv().as_deref(), Ok("buffered"));
    assert!(rx.try_recv().is_err());
}

#[test]
fn identity_is_anonymous_without_uid() {
    let identity = Identity { uid: None, role: Some("viewer".to_owned()) };
    assert!(identity.is_anonymous());

    let identity = Identity { uid: Some("u1".to_owned()), role: None };
    assert!(!identity.is_anonymous());
}
