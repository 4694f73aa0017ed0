//! Benchmark workloads for the cram storage engine.
//!
//! Provides deterministic, seeded builders shared by the criterion
//! benches and the examples:
//!
//! - [`mixed_shapes`]: a collection of randomly sized shape elements
//! - [`churn`]: an erase-then-push steady-state workload
//! - [`erase_front`]: worst-case front erasure until empty

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use cram::PolyVec;
use cram_test_utils::{Circle, Dot, Polygon, Rect, Shape};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Build a collection of `n` shapes with sizes drawn from a seeded RNG.
///
/// Identical seeds produce bit-identical element sequences, so paired
/// benchmark runs measure the same workload.
pub fn mixed_shapes(n: usize, seed: u64) -> PolyVec<dyn Shape> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut shapes: PolyVec<dyn Shape> = PolyVec::new();
    for k in 0..n {
        match rng.random_range(0..4u8) {
            0 => {
                shapes.push(Dot(k as u8));
            }
            1 => {
                shapes.push(Circle { radius: k as f64 });
            }
            2 => {
                shapes.push(Rect {
                    width: k as f64,
                    height: 2.0,
                });
            }
            _ => {
                shapes.push(Polygon::regular(3 + (k % 6), 1.0));
            }
        }
    }
    shapes
}

/// Steady-state churn: `rounds` iterations of erasing a small random
/// range and pushing replacements, exercising deferred compaction and
/// hole reabsorption without net growth.
pub fn churn(shapes: &mut PolyVec<dyn Shape>, rounds: usize, seed: u64) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    for round in 0..rounds {
        let len = shapes.len();
        if len > 4 {
            let i = rng.random_range(0..len - 3);
            let width = rng.random_range(1..=3usize);
            shapes
                .erase(i..(i + width).min(len))
                .expect("range is in bounds");
        }
        shapes.push(Circle {
            radius: round as f64,
        });
        shapes.push(Dot(round as u8));
    }
}

/// Erase from the front until empty: the worst case for compaction,
/// every surviving element relocating on every call.
pub fn erase_front(shapes: &mut PolyVec<dyn Shape>) {
    while !shapes.is_empty() {
        shapes.remove(0).expect("index 0 is in bounds");
    }
}
