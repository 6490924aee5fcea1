use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use common::decimal::{dec, Amount};
use common::model::balance::Balance;
use common::model::client::Client;
use common::model::currency::Currency;
use common::model::order::Order;
use matching_engine::{Exchange, MatchingEngine, SubmitResult};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

const TRADED: [Currency; 3] = [Currency::USD, Currency::EUR, Currency::GBP];

// Ratios between these values are powers of two, so every derived rate is
// exact and compatibility is symmetric.
fn source_values() -> [Amount; 3] {
    [dec!(100), dec!(200), dec!(400)]
}

fn target_values() -> [Amount; 5] {
    [dec!(50), dec!(100), dec!(200), dec!(400), dec!(800)]
}

fn random_order(rng: &mut StdRng, client: Client) -> Order {
    let source = *TRADED.choose(rng).unwrap();
    let targets: Vec<Currency> = TRADED.iter().copied().filter(|c| *c != source).collect();
    let target = *targets.choose(rng).unwrap();
    let source_value = *source_values().choose(rng).unwrap();
    let target_value = *target_values().choose(rng).unwrap();
    Order::new(client, source, target, source_value, target_value).unwrap()
}

fn fund(engine: &MatchingEngine, client: Client, deposits: &mut Balance) {
    let initial_deposit = dec!(100000);
    for currency in TRADED {
        engine.deposit(client, currency, initial_deposit).unwrap();
        *deposits = deposits.clone().with_amount(currency, initial_deposit);
    }
}

#[derive(Default)]
struct WorkerStats {
    resting: usize,
    covered: usize,
    rejected: usize,
}

#[test]
fn test_concurrent_stress_conserves_funds() {
    const SEEDED: usize = 40;
    const WORKERS: u64 = 8;
    const ORDERS_PER_WORKER: usize = 300;

    let engine = Arc::new(MatchingEngine::new());
    let mut deposits = Balance::new();
    let mut clients = Vec::new();

    // Pre-seeded resting orders
    let mut rng = StdRng::seed_from_u64(7);
    let seeder = engine.create_client();
    fund(&engine, seeder, &mut deposits);
    clients.push(seeder);
    let mut seeded_resting = 0;
    for _ in 0..SEEDED {
        if let SubmitResult::Resting(_) = engine.submit_order(random_order(&mut rng, seeder)).unwrap() {
            seeded_resting += 1;
        }
    }
    let seeded_covers = engine.get_cover_count() as usize;

    let worker_clients: Vec<Client> = (0..WORKERS)
        .map(|_| {
            let client = engine.create_client();
            fund(&engine, client, &mut deposits);
            client
        })
        .collect();
    clients.extend(worker_clients.iter().copied());

    let barrier = Arc::new(Barrier::new(WORKERS as usize));
    let handles: Vec<_> = worker_clients
        .into_iter()
        .enumerate()
        .map(|(worker, client)| {
            let engine = Arc::clone(&engine);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut rng = StdRng::seed_from_u64(1000 + worker as u64);
                let mut stats = WorkerStats::default();
                barrier.wait();
                for _ in 0..ORDERS_PER_WORKER {
                    match engine.submit_order(random_order(&mut rng, client)) {
                        Ok(SubmitResult::Resting(_)) => stats.resting += 1,
                        Ok(SubmitResult::Covered(_)) => stats.covered += 1,
                        Err(e) if e.is_insufficient_funds() => stats.rejected += 1,
                        Err(e) => panic!("unexpected error: {}", e),
                    }
                }
                stats
            })
        })
        .collect();

    let stats: Vec<WorkerStats> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let resting: usize = stats.iter().map(|s| s.resting).sum();
    let covered: usize = stats.iter().map(|s| s.covered).sum();
    let rejected: usize = stats.iter().map(|s| s.rejected).sum();
    assert_eq!(resting + covered + rejected, WORKERS as usize * ORDERS_PER_WORKER);

    // Conservation
    assert_eq!(engine.get_aggregate_balance(), deposits);

    // Every cover is counted exactly once
    assert_eq!(engine.get_cover_count() as usize, seeded_covers + covered);

    // Each cover removed exactly one resting order
    let open_orders = engine.get_open_orders();
    assert_eq!(open_orders.len(), seeded_resting + resting - seeded_covers - covered);

    // No overdraft
    for client in &clients {
        let balance = engine.get_client_balance(*client).unwrap();
        assert!(balance.iter().all(|(_, amount)| amount >= Amount::ZERO));
    }

    // No two compatible orders were left resting against each other
    for resting in &open_orders {
        for other in open_orders.iter().filter(|o| o.pair() == resting.pair().inverse()) {
            assert!(
                !resting.info().covers(other.info()),
                "order {} could cover order {}",
                resting.id(),
                other.id()
            );
        }
    }
}

#[test]
fn test_resting_order_never_double_matched() {
    const RACERS: usize = 16;

    let engine = Arc::new(MatchingEngine::new());
    let seller = engine.create_client();
    engine.deposit(seller, Currency::EUR, dec!(100)).unwrap();
    engine
        .submit_order(Order::new(seller, Currency::EUR, Currency::USD, dec!(100), dec!(100)).unwrap())
        .unwrap();

    let barrier = Arc::new(Barrier::new(RACERS));
    let handles: Vec<_> = (0..RACERS)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let barrier = Arc::clone(&barrier);
            let buyer = engine.create_client();
            engine.deposit(buyer, Currency::USD, dec!(100)).unwrap();
            thread::spawn(move || {
                barrier.wait();
                let order = Order::new(buyer, Currency::USD, Currency::EUR, dec!(100), dec!(100)).unwrap();
                engine.submit_order(order).unwrap().is_covered()
            })
        })
        .collect();

    let covered = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|covered| *covered)
        .count();

    assert_eq!(covered, 1);
    assert_eq!(engine.get_cover_count(), 1);
    // Everyone else is resting on the USD/EUR side
    assert_eq!(engine.get_open_orders().len(), RACERS - 1);
    assert_eq!(engine.get_client_balance(seller).unwrap().get(Currency::USD), dec!(100));
}

#[test]
fn test_racing_withdrawals_and_orders_never_overdraw() {
    const RACERS: usize = 12;

    let engine = Arc::new(MatchingEngine::new());
    let client = engine.create_client();
    engine.deposit(client, Currency::USD, dec!(100)).unwrap();

    let barrier = Arc::new(Barrier::new(RACERS));
    let handles: Vec<_> = (0..RACERS)
        .map(|racer| {
            let engine = Arc::clone(&engine);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut successes = 0;
                for _ in 0..5 {
                    let result = if racer % 2 == 0 {
                        engine.withdraw(client, Currency::USD, dec!(10))
                    } else {
                        let order = Order::new(client, Currency::USD, Currency::RUB, dec!(10), dec!(900)).unwrap();
                        engine.submit_order(order).map(|_| ())
                    };
                    match result {
                        Ok(()) => successes += 1,
                        Err(e) => assert!(e.is_insufficient_funds()),
                    }
                }
                successes
            })
        })
        .collect();

    let successes: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    let resting = engine.get_open_orders().len();
    let withdrawn = Amount::from(successes - resting) * dec!(10);

    assert_eq!(successes, 10);
    assert_eq!(engine.get_client_balance(client).unwrap().get(Currency::USD), Amount::ZERO);
    let expected = Balance::new().with_amount(Currency::USD, dec!(100) - withdrawn);
    assert_eq!(engine.get_aggregate_balance(), expected);
}

#[test]
fn test_cover_count_is_monotonic() {
    let engine = Arc::new(MatchingEngine::new());
    let done = Arc::new(AtomicBool::new(false));

    let reader = {
        let engine = Arc::clone(&engine);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut last = 0;
            while !done.load(Ordering::SeqCst) {
                let current = engine.get_cover_count();
                assert!(current >= last);
                last = current;
            }
            last
        })
    };

    let writers: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let client = engine.create_client();
            engine.deposit(client, Currency::USD, dec!(1000)).unwrap();
            engine.deposit(client, Currency::EUR, dec!(1000)).unwrap();
            thread::spawn(move || {
                for i in 0..50 {
                    let (source, target) = if i % 2 == 0 {
                        (Currency::USD, Currency::EUR)
                    } else {
                        (Currency::EUR, Currency::USD)
                    };
                    let order = Order::new(client, source, target, dec!(10), dec!(10)).unwrap();
                    engine.submit_order(order).unwrap();
                }
            })
        })
        .collect();

    for writer in writers {
        writer.join().unwrap();
    }
    done.store(true, Ordering::SeqCst);
    let observed = reader.join().unwrap();

    // Every pair of opposite 10-for-10 orders covers, so nothing is left
    assert_eq!(engine.get_cover_count(), 100);
    assert!(observed <= 100);
    assert!(engine.get_open_orders().is_empty());
}
