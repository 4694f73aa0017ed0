//! Walkthrough of the collection under churn: build a mixed workload,
//! erase ranges, and watch the buffer fragment and heal.
//!
//! Run with: `cargo run -p cram-bench --example shapes`

use cram_bench::mixed_shapes;
use cram_test_utils::Shape;

fn main() {
    let mut shapes = mixed_shapes(24, 42);
    report("after build", &shapes);

    shapes.erase(4..12).expect("range is in bounds");
    report("after erasing 4..12", &shapes);

    shapes.erase(0..4).expect("range is in bounds");
    report("after erasing 0..4", &shapes);

    while shapes.store().section_count() > 0 {
        shapes.remove(0).expect("collection is non-empty");
    }
    report("after healing", &shapes);

    let total: f64 = shapes.iter().map(Shape::area).sum();
    println!("total area of survivors: {total:.2}");
}

fn report(stage: &str, shapes: &cram::PolyVec<dyn Shape>) {
    let store = shapes.store();
    println!(
        "{stage}: {} elements, {} of {} bytes used, {} deferred hole(s)",
        shapes.len(),
        store.used_bytes(),
        store.capacity(),
        store.section_count(),
    );
}
