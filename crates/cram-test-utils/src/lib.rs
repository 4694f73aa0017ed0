//! Test fixtures for cram development.
//!
//! Provides the [`Shape`] capability trait with impls of assorted sizes
//! and alignments, the [`Tally`]/[`Tracked`] pair for counting
//! constructions, clones, and drops, and the [`Aligned16`] probe for
//! address-alignment checks.

// `capability!` expands to impls of an unsafe trait, so `forbid` would
// reject the expansion; everything handwritten here is safe code.
#![deny(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::cell::Cell;
use std::f64::consts::PI;
use std::rc::Rc;

use cram::capability;

/// Capability trait shared by every fixture element type.
pub trait Shape {
    fn name(&self) -> &'static str;
    fn area(&self) -> f64;
}
capability!(Shape);

/// 8-byte element.
#[derive(Clone, Debug, PartialEq)]
pub struct Circle {
    pub radius: f64,
}

impl Shape for Circle {
    fn name(&self) -> &'static str {
        "circle"
    }

    fn area(&self) -> f64 {
        PI * self.radius * self.radius
    }
}

/// 16-byte element.
#[derive(Clone, Debug, PartialEq)]
pub struct Rect {
    pub width: f64,
    pub height: f64,
}

impl Shape for Rect {
    fn name(&self) -> &'static str {
        "rect"
    }

    fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// Large element: a fixed-capacity polygon, well over a cache line.
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    pub vertices: [[f64; 2]; 8],
    pub count: usize,
}

impl Polygon {
    /// A regular `count`-gon with the given circumradius.
    pub fn regular(count: usize, radius: f64) -> Self {
        assert!((3..=8).contains(&count));
        let mut vertices = [[0.0; 2]; 8];
        for (k, v) in vertices.iter_mut().take(count).enumerate() {
            let angle = 2.0 * PI * k as f64 / count as f64;
            *v = [radius * angle.cos(), radius * angle.sin()];
        }
        Self { vertices, count }
    }
}

impl Shape for Polygon {
    fn name(&self) -> &'static str {
        "polygon"
    }

    fn area(&self) -> f64 {
        // Shoelace formula over the first `count` vertices.
        let mut doubled = 0.0;
        for k in 0..self.count {
            let [x0, y0] = self.vertices[k];
            let [x1, y1] = self.vertices[(k + 1) % self.count];
            doubled += x0 * y1 - x1 * y0;
        }
        doubled.abs() / 2.0
    }
}

/// One-byte element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dot(pub u8);

impl Shape for Dot {
    fn name(&self) -> &'static str {
        "dot"
    }

    fn area(&self) -> f64 {
        0.0
    }
}

/// 16-byte-aligned probe for address-modulo checks.
#[derive(Clone, Debug, PartialEq, Eq)]
#[repr(align(16))]
pub struct Aligned16(pub u64);

impl Shape for Aligned16 {
    fn name(&self) -> &'static str {
        "aligned16"
    }

    fn area(&self) -> f64 {
        self.0 as f64
    }
}

/// Shared construction/clone/drop counters for [`Tracked`] elements.
#[derive(Debug, Default)]
pub struct Tally {
    created: Cell<usize>,
    cloned: Cell<usize>,
    dropped: Cell<usize>,
}

impl Tally {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn created(&self) -> usize {
        self.created.get()
    }

    pub fn cloned(&self) -> usize {
        self.cloned.get()
    }

    pub fn dropped(&self) -> usize {
        self.dropped.get()
    }

    /// Instances currently alive: every construction (fresh or clone)
    /// minus every drop. Zero after teardown means no leak; never
    /// negative means no double free.
    pub fn live(&self) -> usize {
        let born = self.created.get() + self.cloned.get();
        born.checked_sub(self.dropped.get())
            .expect("more drops than constructions")
    }
}

/// An element that reports its lifecycle to a shared [`Tally`].
#[derive(Debug)]
pub struct Tracked {
    pub value: u64,
    tally: Rc<Tally>,
}

impl Tracked {
    pub fn new(tally: &Rc<Tally>, value: u64) -> Self {
        tally.created.set(tally.created.get() + 1);
        Self {
            value,
            tally: Rc::clone(tally),
        }
    }
}

impl Clone for Tracked {
    fn clone(&self) -> Self {
        self.tally.cloned.set(self.tally.cloned.get() + 1);
        Self {
            value: self.value,
            tally: Rc::clone(&self.tally),
        }
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.tally.dropped.set(self.tally.dropped.get() + 1);
    }
}

impl Shape for Tracked {
    fn name(&self) -> &'static str {
        "tracked"
    }

    fn area(&self) -> f64 {
        self.value as f64
    }
}
