// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Adaptive anti-aliasing by recursive subdivision.
//!
//! At depth one a pixel is the average of five points: its four
//! corners and its center.
//!
//! ```text
//!    p1 ------- p2
//!     |         |
//!     |   p5    |
//!     |         |
//!    p3 ------- p4
//! ```
//!
//! At greater depths the pixel is split into four quadrants, each of
//! which is sampled one level shallower, and the pixel is the average
//! of the quadrants.
//!
//! Corners are shared with neighbouring pixels, so they go through the
//! worker's `SampleCache`.  Pixels are visited in row-major order, and
//! quadrants top-left, top-right, bottom-left, bottom-right.  Both
//! orders only ever move right or down, which means a corner's first
//! user is always the cell up and to its left (it's that cell's p4) and
//! its last user is always the cell down and to its right (that cell's
//! p1).  Everything in between is a read.  The only exceptions are
//! corners on the edges of the band, which have fewer users, and that's
//! what `Edges` tracks.
//!
//! Cells are addressed by lattice node rather than by coordinate, and
//! a cell at depth `d` spans `2^d` nodes.  Every point is looked up
//! from its node, so a corner reached from two different cells is the
//! same point to the last bit.

use num::Complex;

use crate::cache::{CacheHint, CacheKey, SampleCache};
use crate::escape::{escape_rate, SampleResult};
use crate::planes::{Lattice, Node};

/// Where a pixel (or a piece of one) sits relative to the band being
/// rendered.  A corner on an edge has fewer neighbours to share with,
/// so it gets stored less, or not at all.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Edges {
    /// Nothing above.
    pub top_row: bool,
    /// Nothing below.
    pub last_row: bool,
    /// Nothing to the left.
    pub first_column: bool,
    /// Nothing to the right.
    pub last_column: bool,
}

/// One quarter of a pixel.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Quadrant {
    /// Upper left.
    TopLeft,
    /// Upper right.
    TopRight,
    /// Lower left.
    BottomLeft,
    /// Lower right.
    BottomRight,
}

/// The order quadrants are sampled in.  The cache hints depend on it.
pub const QUADRANTS: [Quadrant; 4] = [
    Quadrant::TopLeft,
    Quadrant::TopRight,
    Quadrant::BottomLeft,
    Quadrant::BottomRight,
];

impl Quadrant {
    /// The upper-left node of this quadrant, given the cell's corner
    /// and half its span.
    fn origin(self, corner: Node, half: usize) -> Node {
        let Node(column, row) = corner;
        match self {
            Quadrant::TopLeft => corner,
            Quadrant::TopRight => Node(column + half, row),
            Quadrant::BottomLeft => Node(column, row + half),
            Quadrant::BottomRight => Node(column + half, row + half),
        }
    }
}

impl Edges {
    /// All four edges: a band one pixel wide and one pixel tall.
    pub const ALL: Edges = Edges {
        top_row: true,
        last_row: true,
        first_column: true,
        last_column: true,
    };

    /// The edges touched by the pixel at `column`, `row` of a band
    /// `width` by `height` pixels.
    pub fn at(column: usize, row: usize, width: usize, height: usize) -> Self {
        Edges {
            top_row: row == 0,
            last_row: row + 1 == height,
            first_column: column == 0,
            last_column: column + 1 == width,
        }
    }

    /// The edges a quadrant inherits from its pixel: only the ones it
    /// actually lies against.
    pub fn restrict(self, quadrant: Quadrant) -> Self {
        match quadrant {
            Quadrant::TopLeft => Edges {
                top_row: self.top_row,
                first_column: self.first_column,
                ..Edges::default()
            },
            Quadrant::TopRight => Edges {
                top_row: self.top_row,
                last_column: self.last_column,
                ..Edges::default()
            },
            Quadrant::BottomLeft => Edges {
                last_row: self.last_row,
                first_column: self.first_column,
                ..Edges::default()
            },
            Quadrant::BottomRight => Edges {
                last_row: self.last_row,
                last_column: self.last_column,
                ..Edges::default()
            },
        }
    }

    /// The cache hints for p1 through p4 of a cell with these edges.
    pub fn corner_hints(self) -> [CacheHint; 4] {
        use crate::cache::CacheHint::*;

        // Top left: first use only at the very corner of the band.
        let p1 = if self.top_row && self.first_column {
            Skip
        } else {
            Remove
        };

        // Top right: nobody to the right means this is the last use,
        // and on the top row the only one.
        let p2 = if self.last_column {
            if self.top_row {
                Skip
            } else {
                Remove
            }
        } else {
            Store
        };

        // Bottom left: nobody below means the same thing.
        let p3 = if self.last_row {
            if self.first_column {
                Skip
            } else {
                Remove
            }
        } else {
            Store
        };

        // Bottom right: always the first use.
        let p4 = if self.last_row && self.last_column {
            Skip
        } else {
            Store
        };

        [p1, p2, p3, p4]
    }
}

/// Samples pixels, possibly many times each, and averages the results.
/// One per worker.  It carries no cache of its own; the caller lends it
/// one on every call.
#[derive(Debug, Default)]
pub struct AdaptiveSampler {
    evaluations: u64,
}

impl AdaptiveSampler {
    /// A sampler that hasn't done anything yet.
    pub fn new() -> Self {
        AdaptiveSampler::default()
    }

    /// How many times the escape-time function has actually been run.
    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    /// Samples the cell whose upper-left corner is the node `corner`
    /// and which spans `2^depth` nodes each way, subdividing `depth`
    /// times.  The result carries the corner's point.
    pub fn sample(
        &mut self,
        cache: &mut SampleCache,
        lattice: &Lattice,
        corner: Node,
        depth: u32,
        edges: Edges,
    ) -> SampleResult {
        match depth {
            // No anti-aliasing, no cache.
            0 => self.evaluate(lattice.point(corner)),
            1 => self.five_point(cache, lattice, corner, edges),
            _ => self.subdivide(cache, lattice, corner, depth, edges),
        }
    }

    fn five_point(
        &mut self,
        cache: &mut SampleCache,
        lattice: &Lattice,
        corner: Node,
        edges: Edges,
    ) -> SampleResult {
        let Node(column, row) = corner;
        let [h1, h2, h3, h4] = edges.corner_hints();
        let p1 = self.point(cache, lattice, corner, h1);
        let p2 = self.point(cache, lattice, Node(column + 2, row), h2);
        let p3 = self.point(cache, lattice, Node(column, row + 2), h3);
        let p4 = self.point(cache, lattice, Node(column + 2, row + 2), h4);
        let p5 = self.point(cache, lattice, Node(column + 1, row + 1), CacheHint::Skip);

        let rate = (p1.rate + p2.rate + p3.rate + p4.rate + p5.rate) / 5;
        SampleResult::new(lattice.point(corner), rate)
    }

    fn subdivide(
        &mut self,
        cache: &mut SampleCache,
        lattice: &Lattice,
        corner: Node,
        depth: u32,
        edges: Edges,
    ) -> SampleResult {
        let half = 1usize << (depth - 1);
        let total: u32 = QUADRANTS
            .iter()
            .map(|&quadrant| {
                let origin = quadrant.origin(corner, half);
                self.sample(cache, lattice, origin, depth - 1, edges.restrict(quadrant))
                    .rate
            })
            .sum();
        SampleResult::new(lattice.point(corner), total / 4)
    }

    // One corner or center, through the cache.
    fn point(
        &mut self,
        cache: &mut SampleCache,
        lattice: &Lattice,
        node: Node,
        hint: CacheHint,
    ) -> SampleResult {
        let point = lattice.point(node);
        let key = CacheKey::new(point);
        if let Some(found) = cache.lookup(key, hint) {
            return found;
        }
        if hint == CacheHint::Remove {
            trace!("final use of {} was not in the cache", point);
        }
        let result = self.evaluate(point);
        cache.store(key, result, hint);
        result
    }

    fn evaluate(&mut self, point: Complex<f64>) -> SampleResult {
        self.evaluations += 1;
        escape_rate(point)
    }
}
