//! Native callback dispatch benchmarks.

use criterion::{Criterion, criterion_group, criterion_main};
use interlink_native::prelude::*;
use std::hint::black_box;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

struct Sensor {
    value_changed: Event<Sensor, f64>,
}

fn sensor_with_handlers(handlers: usize) -> Arc<Sensor> {
    let sensor = Arc::new(Sensor {
        value_changed: Event::new("value_changed"),
    });
    let total = Arc::new(AtomicU64::new(0));
    for _ in 0..handlers {
        let total = Arc::clone(&total);
        sensor.value_changed.subscribe(move |_, _| {
            total.fetch_add(1, Ordering::Relaxed);
        });
    }
    sensor
}

fn bench_dispatch_delivered(c: &mut Criterion) {
    let Ok(runtime) = Runtime::new(RuntimeConfig::default()) else {
        return;
    };
    let sensor = sensor_with_handlers(4);
    let Ok(registration) = runtime.register_owner(&sensor) else {
        return;
    };
    let context = registration.context();

    c.bench_function("dispatch_delivered_4_handlers", |b| {
        b.iter(|| {
            runtime.dispatch::<Sensor, _>(black_box(context), |sensor| {
                sensor.value_changed.broadcast(sensor, black_box(&0.25));
            })
        });
    });
}

fn bench_dispatch_stale(c: &mut Criterion) {
    let Ok(config) = RuntimeConfig::builder().log_stale_dispatch(false).build() else {
        return;
    };
    let Ok(runtime) = Runtime::new(config) else {
        return;
    };
    let sensor = sensor_with_handlers(1);
    let Ok(registration) = runtime.register_owner(&sensor) else {
        return;
    };
    let context = registration.context();
    registration.release();

    c.bench_function("dispatch_stale_context", |b| {
        b.iter(|| runtime.dispatch::<Sensor, _>(black_box(context), |_| {}));
    });
}

fn bench_register_release(c: &mut Criterion) {
    let Ok(runtime) = Runtime::new(RuntimeConfig::default()) else {
        return;
    };
    let sensor = sensor_with_handlers(0);

    c.bench_function("register_release", |b| {
        b.iter(|| {
            if let Ok(registration) = runtime.register_owner(black_box(&sensor)) {
                registration.release();
            }
        });
    });
}

criterion_group!(
    benches,
    bench_dispatch_delivered,
    bench_dispatch_stale,
    bench_register_release
);
criterion_main!(benches);
