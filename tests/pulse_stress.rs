use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use proptest::prelude::*;

use hall_velocity_regulator::PulseCounter;

const PRODUCERS: usize = 4;
const EDGES_PER_PRODUCER: u64 = 250_000;

#[test]
fn concurrent_edges_are_counted_exactly_once() {
    let pulses = PulseCounter::new();
    let done = AtomicBool::new(false);

    let (total, reads) = thread::scope(|s| {
        let producers: Vec<_> = (0..PRODUCERS)
            .map(|_| {
                s.spawn(|| {
                    for _ in 0..EDGES_PER_PRODUCER {
                        pulses.on_edge();
                    }
                })
            })
            .collect();

        let consumer = s.spawn(|| {
            let mut total = 0u64;
            let mut reads = 0u64;
            while !done.load(Ordering::Acquire) {
                total += pulses.read_and_clear().unwrap() as u64;
                reads += 1;
            }
            // Edges that landed after the last in-loop read.
            total += pulses.read_and_clear().unwrap() as u64;
            (total, reads + 1)
        });

        for p in producers {
            p.join().unwrap();
        }
        done.store(true, Ordering::Release);
        consumer.join().unwrap()
    });

    assert_eq!(total, PRODUCERS as u64 * EDGES_PER_PRODUCER);
    assert!(reads > 1);
    assert_eq!(pulses.pending(), 0);
}

#[derive(Clone, Debug)]
enum Op {
    Edge,
    Read,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![3 => Just(Op::Edge), 1 => Just(Op::Read)]
}

proptest! {
    #[test]
    fn reads_sum_to_edge_count(ops in proptest::collection::vec(op(), 0..512)) {
        let pulses = PulseCounter::new();
        let mut edges = 0u32;
        let mut seen = 0u32;

        for op in &ops {
            match op {
                Op::Edge => {
                    pulses.on_edge();
                    edges += 1;
                }
                Op::Read => seen += pulses.read_and_clear().unwrap(),
            }
        }
        seen += pulses.read_and_clear().unwrap();

        prop_assert_eq!(seen, edges);
    }
}
