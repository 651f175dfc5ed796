//! Concurrency tests: broadcasts racing subscribe, unsubscribe and target drops.

use interlink_events::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[test]
fn test_concurrent_subscribe_and_broadcast() -> TestResult {
    let hub = Arc::new(Event::<u32, u64>::new("position_changed"));
    let hits = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(5));
    let mut handles = vec![];

    for _ in 0..4 {
        let hub = Arc::clone(&hub);
        let hits = Arc::clone(&hits);
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            for _ in 0..100 {
                let hits = Arc::clone(&hits);
                hub.subscribe(move |_, _| {
                    hits.fetch_add(1, Ordering::Relaxed);
                });
            }
        }));
    }

    let broadcaster = {
        let hub = Arc::clone(&hub);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            for position in 0..200u64 {
                hub.broadcast(&7, &position);
            }
        })
    };

    for handle in handles {
        handle.join().map_err(|_| "subscriber thread panicked")?;
    }
    broadcaster
        .join()
        .map_err(|_| "broadcaster thread panicked")?;

    assert_eq!(hub.len(), 400);

    let before = hits.load(Ordering::Relaxed);
    hub.broadcast(&7, &0);
    assert_eq!(hits.load(Ordering::Relaxed) - before, 400);
    Ok(())
}

#[test]
fn test_unsubscribe_is_effective_for_later_broadcasts() -> TestResult {
    let hub = Arc::new(SimpleEvent::<()>::new("detach"));
    let removed = Arc::new(AtomicBool::new(false));
    let late_calls = Arc::new(AtomicUsize::new(0));

    let flag = Arc::clone(&removed);
    let late = Arc::clone(&late_calls);
    let handler = hub.subscribe(move |()| {
        if flag.load(Ordering::SeqCst) {
            late.fetch_add(1, Ordering::SeqCst);
        }
    });

    let broadcaster = {
        let hub = Arc::clone(&hub);
        thread::spawn(move || {
            for _ in 0..1_000 {
                hub.broadcast(&());
            }
        })
    };

    thread::yield_now();
    hub.unsubscribe(&handler);
    removed.store(true, Ordering::SeqCst);

    broadcaster
        .join()
        .map_err(|_| "broadcaster thread panicked")?;

    let settled = late_calls.load(Ordering::SeqCst);
    for _ in 0..10 {
        hub.broadcast(&());
    }
    // At most one in-flight broadcast may observe the flag before removal landed.
    assert!(settled <= 1);
    assert_eq!(late_calls.load(Ordering::SeqCst), settled);
    Ok(())
}

#[test]
fn test_targets_dropped_while_broadcasting() -> TestResult {
    struct Sensor {
        readings: AtomicUsize,
    }

    let hub = Arc::new(Event::<(), f64>::new("voltage_changed"));
    let mut targets = Vec::new();
    for _ in 0..64 {
        let sensor = Arc::new(Sensor {
            readings: AtomicUsize::new(0),
        });
        hub.subscribe_bound(&sensor, |sensor, (), _| {
            sensor.readings.fetch_add(1, Ordering::Relaxed);
        });
        targets.push(sensor);
    }

    let broadcaster = {
        let hub = Arc::clone(&hub);
        thread::spawn(move || {
            for step in 0..500u32 {
                hub.broadcast(&(), &f64::from(step));
            }
        })
    };

    while let Some(sensor) = targets.pop() {
        drop(sensor);
        thread::yield_now();
    }

    broadcaster
        .join()
        .map_err(|_| "broadcaster thread panicked")?;

    // Entries the broadcaster has not already dropped go on the next broadcast.
    hub.broadcast(&(), &0.0);
    assert!(hub.is_empty());
    assert_eq!(hub.purge_released(), 0);
    Ok(())
}

#[test]
fn test_static_initializer_runs_once_under_contention() -> TestResult {
    static INIT: EventInit = EventInit::new();
    static RUNS: AtomicUsize = AtomicUsize::new(0);

    let barrier = Arc::new(Barrier::new(8));
    let mut handles = vec![];
    for _ in 0..8 {
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            let hub: StaticEvent<String> =
                StaticEvent::with_initializer("server_added", &INIT, || {
                    RUNS.fetch_add(1, Ordering::SeqCst);
                });
            hub.len()
        }));
    }

    for handle in handles {
        let len = handle.join().map_err(|_| "constructor thread panicked")?;
        assert_eq!(len, 0);
    }

    assert_eq!(RUNS.load(Ordering::SeqCst), 1);
    assert!(INIT.is_completed());
    Ok(())
}
