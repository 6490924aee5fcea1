use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

use common::decimal::dec;
use common::model::client::Client;
use common::model::currency::Currency;
use common::model::order::Order;
use matching_engine::{Exchange, MatchingEngine};

fn funded_engine() -> (MatchingEngine, Client) {
    let engine = MatchingEngine::new();
    let client = engine.create_client();
    for currency in Currency::ALL {
        engine.deposit(client, currency, dec!(1000000000)).unwrap();
    }
    (engine, client)
}

fn rest_orders(engine: &MatchingEngine, client: Client, count: usize) {
    for _ in 0..count {
        let order = Order::new(client, Currency::EUR, Currency::USD, dec!(10), dec!(12)).unwrap();
        engine.submit_order(order).unwrap();
    }
}

fn benchmarks(c: &mut Criterion) {
    c.bench_function("submit resting order", |b| {
        let (engine, client) = funded_engine();
        b.iter(|| {
            let order = Order::new(client, Currency::USD, Currency::GBP, dec!(10), dec!(10)).unwrap();
            black_box(engine.submit_order(order).unwrap());
        })
    });

    c.bench_function("cover against 1000 resting orders", |b| {
        b.iter_batched(
            || {
                let (engine, client) = funded_engine();
                rest_orders(&engine, client, 1000);
                (engine, client)
            },
            |(engine, client)| {
                let order = Order::new(client, Currency::USD, Currency::EUR, dec!(12), dec!(10)).unwrap();
                black_box(engine.submit_order(order).unwrap());
            },
            BatchSize::LargeInput,
        )
    });
}

criterion_group!(benches, benchmarks);
criterion_main!(benches);
