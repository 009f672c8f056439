//! Encodes a few typical messages, prints their wire bytes, and decodes them
//! back. Run with `RUST_LOG=debug` to watch the codec's decisions.

use routewire::prelude::*;
use routewire::protocol::{Frame, MessageCodec, RouteRef};
use serde::Serialize;
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Serialize)]
struct Scoreboard {
    round: u32,
    scores: Vec<(String, u32)>,
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn dump(label: &str, bytes: &[u8], msg: &Message) {
    println!("{label} ({} bytes)", bytes.len());
    println!("  wire:  {}", hex(bytes));
    println!(
        "  kind={} id={} route={:?} error={} body={}",
        msg.kind,
        msg.id,
        msg.route,
        msg.error,
        String::from_utf8_lossy(&msg.body)
    );
}

fn main() -> Result<(), RoutewireError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let handshake = json!({
        "code": 200,
        "sys": { "dict": { "room.join": 1, "room.onScore": 2 } }
    });
    let dict = RouteDictionary::from_handshake(&handshake)?;
    let client = ClientCodec::builder().dictionary(dict).build()?;
    let server = MessageCodec::new(CodecConfig::default())?;

    // Request with a dictionary route.
    let bytes = client.encode_json(1, "room.join", &json!({ "room": 42 }))?;
    let msg = server.decode(Some(client.dictionary()), &bytes)?;
    dump("request room.join", &bytes, &msg);

    // Notify with an inline route.
    let bytes = client.encode_json(NOTIFY_PUSH_ID, "user.login", &json!({ "name": "a" }))?;
    let msg = server.decode(None, &bytes)?;
    dump("notify user.login", &bytes, &msg);

    // Push whose body is big enough for gzip to pay off.
    let board = Scoreboard {
        round: 3,
        scores: (0..20).map(|i| (format!("player-{i}"), i * 10)).collect(),
    };
    let body = server.encode_json_body(&board)?;
    let frame = Frame::new(MessageKind::Push, 0, Some(RouteRef::Code(2)), &body);
    let bytes = server.encode(&frame)?;
    let msg = client.decode(&bytes)?;
    dump("push room.onScore", &bytes, &msg);

    // Error response.
    let body = server.encode_json_body(&json!({ "code": 404, "msg": "no such room" }))?;
    let frame = Frame::new(MessageKind::Response, 1, None, &body).with_error(true);
    let bytes = server.encode(&frame)?;
    let msg = client.decode(&bytes)?;
    dump("error response", &bytes, &msg);

    // Damaged input.
    let msg = client.decode_or_invalid(&bytes[..1]);
    println!("truncated response -> valid={}", msg.is_valid());

    Ok(())
}
