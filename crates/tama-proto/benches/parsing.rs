//! Benchmarks for IRC message parsing, serialization and framing.

use bytes::BytesMut;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tama_proto::{LineCodec, Message};
use tokio_util::codec::Decoder;

/// Simple PING message
const SIMPLE_MESSAGE: &[u8] = b"PING :irc.example.com";

/// Message with prefix
const PREFIX_MESSAGE: &[u8] = b":nick!user@host PRIVMSG #channel :Hello, world!";

/// Numeric response
const NUMERIC_RESPONSE: &[u8] =
    b":irc.server.net 001 nickname :Welcome to the IRC Network nickname!user@host";

/// Long middle list
const MANY_PARAMS: &[u8] =
    b":irc.server.net 005 tama CHANTYPES=# EXCEPTS INVEX CHANMODES=eIbq,k,flj,CFLMPQScgimnprstz CHANLIMIT=#:120 PREFIX=(ov)@+ MAXLIST=bqeI:100 MODES=4 NETWORK=example :are supported by this server";

fn benchmark_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("Message Parsing");

    for (name, raw) in [
        ("simple_ping", SIMPLE_MESSAGE),
        ("with_prefix", PREFIX_MESSAGE),
        ("numeric_response", NUMERIC_RESPONSE),
        ("many_params", MANY_PARAMS),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| black_box(Message::parse(black_box(raw)).unwrap()))
        });
    }

    group.finish();
}

fn benchmark_serialization(c: &mut Criterion) {
    let msg = Message::parse(PREFIX_MESSAGE).unwrap();
    c.bench_function("serialize_privmsg", |b| {
        b.iter(|| black_box(black_box(&msg).to_bytes()))
    });
}

fn benchmark_framing(c: &mut Criterion) {
    let mut stream = Vec::new();
    for _ in 0..64 {
        stream.extend_from_slice(PREFIX_MESSAGE);
        stream.extend_from_slice(b"\r\n");
    }

    c.bench_function("frame_64_lines", |b| {
        b.iter(|| {
            let mut codec = LineCodec::new();
            let mut buf = BytesMut::from(&stream[..]);
            let mut count = 0;
            while let Ok(Some(frame)) = codec.decode(&mut buf) {
                count += black_box(frame).len();
            }
            count
        })
    });
}

criterion_group!(
    benches,
    benchmark_parsing,
    benchmark_serialization,
    benchmark_framing
);
criterion_main!(benches);
