use crate::{ActiveObjectId, Event, ReplyableRequest, Signal};

#[test]
fn probe_signals_stay_below_user_range() {
    assert!(Signal::INIT.is_probe());
    assert!(Signal::ENTRY.is_probe());
    assert!(Signal::EXIT.is_probe());
    assert!(Signal::EMPTY.is_probe());
    assert!(!Signal::USER.is_probe());
}

#[test]
fn offset_numbers_from_a_base() {
    assert_eq!(Signal::USER.offset(0), Signal::USER);
    assert_eq!(Signal::USER.offset(3), Signal(Signal::USER.0 + 3));
    assert!(!Signal::USER.offset(7).is_probe());
}

#[test]
fn static_event_has_no_payload() {
    let evt = Event::new(Signal(0x10));
    assert_eq!(evt.signal(), Signal(0x10));
    assert!(!evt.has_payload());
    assert!(evt.payload::<u32>().is_none());
}

#[test]
fn payload_downcast_is_typed() {
    #[derive(Debug, PartialEq)]
    struct Body {
        value: u32,
    }

    let evt = Event::with_payload(Signal(0x11), Body { value: 7 });
    assert_eq!(evt.payload::<Body>(), Some(&Body { value: 7 }));
    assert!(evt.payload::<u8>().is_none());

    // Clones share the payload allocation.
    let dup = evt.clone();
    assert_eq!(dup.payload::<Body>(), Some(&Body { value: 7 }));
}

#[test]
fn reply_echoes_request_id() {
    let req = ReplyableRequest::new(ActiveObjectId::new(3), 42);
    let rsp = req.response();
    assert!(rsp.matches(42));
    assert!(!rsp.matches(41));
}
