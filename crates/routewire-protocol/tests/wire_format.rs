//! Integration tests for the wire format: round trips across every kind,
//! dictionary substitution, and rejection of damaged input.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use routewire_protocol::{
    CodecConfig, EncodedBody, ErrorCategory, Frame, MessageCodec, MessageKind, NOTIFY_PUSH_ID,
    ProtocolError, RouteDictionary, RouteRef,
};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};

// =========================================================================
// Helpers
// =========================================================================

fn codec() -> MessageCodec {
    MessageCodec::new(CodecConfig::default()).unwrap()
}

fn plain_codec() -> MessageCodec {
    MessageCodec::new(CodecConfig {
        disable_compression: true,
        ..CodecConfig::default()
    })
    .unwrap()
}

fn dictionary() -> RouteDictionary {
    [
        ("connector.entry", 1),
        ("room.join", 2),
        ("room.chat", 300),
        ("user.login", 0xFFFF),
    ]
    .into_iter()
    .collect()
}

fn route_for(kind: MessageKind, route: &str) -> Option<RouteRef<'_>> {
    kind.has_route().then_some(RouteRef::Name(route))
}

const ALL_KINDS: [MessageKind; 4] = [
    MessageKind::Request,
    MessageKind::Notify,
    MessageKind::Response,
    MessageKind::Push,
];

// =========================================================================
// Round trips
// =========================================================================

#[test]
fn test_round_trip_string_route_every_kind() {
    let codec = plain_codec();
    for kind in ALL_KINDS {
        let body = EncodedBody::plain(b"{\"seat\":3}".to_vec());
        let frame = Frame::new(kind, 77, route_for(kind, "room.join"), &body);
        let bytes = codec.encode(&frame).unwrap();
        let msg = codec.decode(None, &bytes).unwrap();

        assert_eq!(msg.kind, kind);
        assert_eq!(msg.body, body.bytes);
        assert_eq!(msg.error, 0);
        if kind.has_id() {
            assert_eq!(msg.id, 77);
        } else {
            assert_eq!(msg.id, NOTIFY_PUSH_ID);
        }
        if kind.has_route() {
            assert_eq!(msg.route.as_deref(), Some("room.join"));
        } else {
            assert_eq!(msg.route, None);
        }
    }
}

#[test]
fn test_round_trip_coded_route() {
    let codec = codec();
    let dict = dictionary();
    for route in ["connector.entry", "room.join", "room.chat", "user.login"] {
        let code = dict.code_for(route).unwrap();
        let body = EncodedBody::plain(b"body".to_vec());
        let frame = Frame::new(MessageKind::Request, 9, Some(RouteRef::Code(code)), &body);
        let bytes = codec.encode(&frame).unwrap();
        assert_eq!(bytes[0] & 0x01, 0x01);
        assert_eq!(&bytes[2..4], &code.to_be_bytes());

        let msg = codec.decode(Some(&dict), &bytes).unwrap();
        assert_eq!(msg.route.as_deref(), Some(route));
    }
}

#[test]
fn test_round_trip_randomized() {
    let codec = codec();
    let mut rng = StdRng::seed_from_u64(0x5EED);
    for _ in 0..500 {
        let kind = ALL_KINDS[rng.random_range(0..4)];
        let id = rng.random_range(0..u32::MAX);
        let route_len = rng.random_range(0..=255);
        let route: String = (0..route_len)
            .map(|_| char::from(rng.random_range(b'a'..=b'z')))
            .collect();
        let mut raw = vec![0u8; rng.random_range(0..2048)];
        // Half random noise, half a repeating pattern gzip can shrink.
        if rng.random_bool(0.5) {
            rng.fill(&mut raw[..]);
        } else {
            for (i, b) in raw.iter_mut().enumerate() {
                *b = (i % 7) as u8;
            }
        }

        let body = codec.encode_body(&raw);
        let frame = Frame::new(kind, id, route_for(kind, &route), &body);
        let bytes = codec.encode(&frame).unwrap();
        let msg = codec.decode(None, &bytes).unwrap();

        assert_eq!(msg.kind, kind);
        assert_eq!(msg.body, raw);
        if kind.has_id() {
            assert_eq!(msg.id, id);
        }
        if kind.has_route() {
            assert_eq!(msg.route.as_deref(), Some(route.as_str()));
        }
    }
}

#[test]
fn test_empty_body_round_trip() {
    let codec = codec();
    let body = codec.encode_body(&[]);
    let frame = Frame::new(MessageKind::Notify, 0, Some(RouteRef::Name("a")), &body);
    let bytes = codec.encode(&frame).unwrap();
    assert_eq!(bytes, [0x02, 1, b'a']);
    assert!(codec.decode(None, &bytes).unwrap().body.is_empty());
}

// =========================================================================
// End-to-end example
// =========================================================================

#[cfg(feature = "json")]
#[test]
fn test_notify_user_login_layout() {
    let codec = plain_codec();
    let body = codec
        .encode_json_body(&serde_json::json!({ "name": "a" }))
        .unwrap();
    let frame = Frame::new(
        MessageKind::Notify,
        NOTIFY_PUSH_ID,
        Some(RouteRef::Name("user.login")),
        &body,
    );
    let bytes = codec.encode(&frame).unwrap();

    assert_eq!((bytes[0] >> 1) & 0x03, MessageKind::Notify.to_wire());
    assert_eq!(bytes[0] & 0x01, 0);
    assert_eq!(bytes[1], 10);
    assert_eq!(&bytes[2..12], b"user.login");
    assert_eq!(&bytes[12..], br#"{"name":"a"}"#);

    let msg = codec.decode(None, &bytes).unwrap();
    assert_eq!(msg.route.as_deref(), Some("user.login"));
    assert_eq!(msg.body, br#"{"name":"a"}"#);
    assert_eq!(codec.decode_json_body(&msg).unwrap()["name"], "a");
}

// =========================================================================
// Rejection
// =========================================================================

#[test]
fn test_truncated_inline_route_header_is_rejected() {
    let codec = codec();
    let body = EncodedBody::plain(b"xyz".to_vec());
    let frame = Frame::new(MessageKind::Request, 16_384, Some(RouteRef::Name("room.join")), &body);
    let bytes = codec.encode(&frame).unwrap();
    // flag(1) + id(3) + len(1) + "room.join"(9)
    let header_len = 14;
    assert_eq!(bytes.len(), header_len + 3);

    for cut in 0..header_len {
        let err = codec.decode(None, &bytes[..cut]).unwrap_err();
        assert!(
            matches!(err, ProtocolError::Truncated { .. }),
            "cut at {cut}: {err}"
        );
        assert_eq!(err.category(), ErrorCategory::Malformed);
    }
    // Header complete, body empty: valid.
    assert!(codec.decode(None, &bytes[..header_len]).unwrap().body.is_empty());
}

#[test]
fn test_truncated_coded_route_header_is_rejected() {
    let codec = codec();
    let dict = dictionary();
    let body = EncodedBody::plain(Vec::new());
    let frame = Frame::new(MessageKind::Request, 200, Some(RouteRef::Code(300)), &body);
    let bytes = codec.encode(&frame).unwrap();
    assert_eq!(bytes.len(), 5);

    for cut in 0..bytes.len() {
        assert!(matches!(
            codec.decode(Some(&dict), &bytes[..cut]),
            Err(ProtocolError::Truncated { .. })
        ));
    }
    assert!(codec.decode(Some(&dict), &bytes).is_ok());
}

#[test]
fn test_unknown_kind_is_rejected() {
    for flag in [0x08u8, 0x0A, 0x0C, 0x0E, 0x1F] {
        let err = codec().decode(None, &[flag, 0, 0, 0]).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownMessageKind(_)), "flag {flag:#04x}");
    }
}

#[test]
fn test_dictionary_miss_is_rejected() {
    let codec = codec();
    // Coded notify whose code isn't in the dictionary. The trailing bytes
    // look like an inline route ("\x04abcd") and must not be read as one.
    let bytes = [0x03, 0x00, 0x63, 4, b'a', b'b', b'c', b'd'];
    let err = codec.decode(Some(&dictionary()), &bytes).unwrap_err();
    assert!(matches!(err, ProtocolError::DictionaryMiss(0x63)));
    assert_eq!(err.category(), ErrorCategory::DictionaryMiss);
}

#[test]
fn test_failures_are_identical_with_a_subscriber_installed() {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .finish();
    tracing::subscriber::with_default(subscriber, || {
        let codec = codec();
        assert!(codec.decode(None, &[]).is_err());
        assert!(codec.decode(None, &[0x12, 1, b'a', 1, 2, 3]).is_err());
        assert!(codec.decode(None, &[0x02, 1, b'a']).is_ok());
    });
}

/// Counts `ERROR` events.
struct ErrorCounter(Arc<AtomicUsize>);

impl<S: tracing::Subscriber> Layer<S> for ErrorCounter {
    fn on_event(&self, event: &tracing::Event<'_>, _: Context<'_, S>) {
        if *event.metadata().level() == tracing::Level::ERROR {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[test]
fn test_failed_inflate_is_logged_once() {
    let errors = Arc::new(AtomicUsize::new(0));
    let subscriber = tracing_subscriber::registry().with(ErrorCounter(Arc::clone(&errors)));
    tracing::subscriber::with_default(subscriber, || {
        let err = codec()
            .decode(None, &[0x12, 1, b'a', 0xDE, 0xAD, 0xBE, 0xEF])
            .unwrap_err();
        assert!(matches!(err, ProtocolError::Inflate(_)));
    });
    assert_eq!(errors.load(Ordering::SeqCst), 1);
}
