//! # LIFO Stack Benchmarks
//!
//! | Path | Target |
//! |------|--------|
//! | Store push/pop (uncontended) | < 1µs per pair |
//! | Header decode | < 10ns |
//! | Full push/pop round trip over localhost | < 1ms |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::thread;
use std::time::Duration;

use stack_service::protocol::Request;
use stack_service::{LifoStore, Message, ServiceConfig, StackClient, StackServer};

fn bench_store_push_pop(c: &mut Criterion) {
    let mut group = c.benchmark_group("store");

    for payload_len in [0usize, 16, 127] {
        let store = LifoStore::new(100);
        let message = Message::new(vec![0x5A; payload_len]).unwrap();

        group.throughput(Throughput::Bytes(payload_len as u64));
        group.bench_with_input(
            BenchmarkId::new("push_pop", payload_len),
            &message,
            |b, message| {
                b.iter(|| {
                    store.try_push(message.clone()).unwrap();
                    black_box(store.try_pop().unwrap())
                })
            },
        );
    }

    let store = std::sync::Arc::new(LifoStore::new(100));
    group.bench_function("contended_push_pop_4_threads", |b| {
        b.iter(|| {
            let workers: Vec<_> = (0..4)
                .map(|_| {
                    let store = std::sync::Arc::clone(&store);
                    thread::spawn(move || {
                        for _ in 0..100 {
                            let message = Message::new(vec![1]).unwrap();
                            if store.try_push(message).is_ok() {
                                while store
                                    .pop_within(Duration::from_millis(1), || false)
                                    .is_none()
                                {}
                            }
                        }
                    })
                })
                .collect();
            for worker in workers {
                worker.join().unwrap();
            }
        })
    });

    group.finish();
}

fn bench_header_decode(c: &mut Criterion) {
    c.bench_function("protocol/decode_header", |b| {
        b.iter(|| {
            for header in 0u8..=255 {
                black_box(Request::decode(black_box(header)));
            }
        })
    });
}

fn bench_round_trip(c: &mut Criterion) {
    let server = StackServer::bind(ServiceConfig::for_testing())
        .and_then(StackServer::spawn)
        .unwrap();
    let client = StackClient::new(server.local_addr()).with_timeout(Duration::from_secs(5));

    let mut group = c.benchmark_group("tcp");
    group.measurement_time(Duration::from_secs(10));
    group.bench_function("push_pop_round_trip", |b| {
        b.iter(|| {
            client.push(b"bench").unwrap();
            black_box(client.pop().unwrap())
        })
    });
    group.finish();

    server.shutdown().unwrap();
}

criterion_group!(
    benches,
    bench_store_push_pop,
    bench_header_decode,
    bench_round_trip
);
criterion_main!(benches);
