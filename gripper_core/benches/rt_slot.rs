use criterion::{Criterion, black_box, criterion_group, criterion_main};
use gripper_core::rt_slot::rt_slot;
use gripper_core::{Command, CommandRequest};

fn bench_publish(c: &mut Criterion) {
    let (mut w, _r) = rt_slot(CommandRequest::hold(0.0, 0.0));
    c.bench_function("slot_publish", |b| {
        b.iter(|| {
            w.publish(CommandRequest {
                command: Command {
                    position: black_box(0.02),
                    max_effort: black_box(30.0),
                },
                goal: None,
            });
        });
    });
}

fn bench_read_stale(c: &mut Criterion) {
    // The common control-cycle case: nothing new was published.
    let (_w, mut r) = rt_slot(CommandRequest::hold(0.0, 0.0));
    c.bench_function("slot_read_stale", |b| {
        b.iter(|| black_box(r.read().is_none()));
    });
}

fn bench_publish_read_pair(c: &mut Criterion) {
    let (mut w, mut r) = rt_slot(0_u64);
    let mut i = 0_u64;
    c.bench_function("slot_publish_then_read", |b| {
        b.iter(|| {
            i = i.wrapping_add(1);
            w.publish(black_box(i));
            black_box(r.read().copied());
        });
    });
}

criterion_group!(
    benches,
    bench_publish,
    bench_read_stale,
    bench_publish_read_pair
);
criterion_main!(benches);
