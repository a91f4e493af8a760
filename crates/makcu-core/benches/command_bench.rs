//! Criterion benchmarks for the backend command grammar.
//!
//! Token rendering sits on the per-frame movement path, so it should stay well
//! below the cost of the process spawn that follows it.
//!
//! Run with:
//! ```bash
//! cargo bench --package makcu-core --bench command_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use makcu_core::{ConnectReply, DeviceCommand, MouseButton};

fn commands() -> Vec<(&'static str, DeviceCommand)> {
    vec![
        ("Move", DeviceCommand::Move { dx: 10, dy: -5 }),
        (
            "MoveSmooth",
            DeviceCommand::MoveSmooth {
                dx: -120,
                dy: 45,
                segments: 10,
            },
        ),
        ("Click", DeviceCommand::Click(MouseButton::Left)),
        ("Scroll", DeviceCommand::Scroll(-3)),
        ("LockX", DeviceCommand::LockX(true)),
        (
            "Connect",
            DeviceCommand::Connect {
                port: Some("COM3".to_string()),
            },
        ),
    ]
}

/// Benchmarks `Display` rendering of each command kind.
fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_token");
    for (name, cmd) in commands() {
        group.bench_with_input(BenchmarkId::new("cmd", name), &cmd, |b, cmd| {
            b.iter(|| black_box(cmd).to_string())
        });
    }
    group.finish();
}

/// Benchmarks `FromStr` parsing of pre-rendered tokens.
fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_token");
    for (name, cmd) in commands() {
        let token = cmd.to_string();
        group.bench_with_input(BenchmarkId::new("cmd", name), &token, |b, token| {
            b.iter(|| {
                black_box(token)
                    .parse::<DeviceCommand>()
                    .expect("parse must succeed")
            })
        });
    }
    group.finish();
}

/// Benchmarks classification of typical `connect` replies.
fn bench_classify_reply(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify_connect_reply");
    for reply in ["connected:COM3", "connected to COM3", "connection_failed"] {
        group.bench_with_input(BenchmarkId::new("reply", reply), reply, |b, reply| {
            b.iter(|| ConnectReply::classify(black_box(reply)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_render, bench_parse, bench_classify_reply);
criterion_main!(benches);
