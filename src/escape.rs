// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The escape-time function.  Take a point on the complex plane, square
//! it and add the original point back, over and over, and count how
//! long it takes before the result is more than 2.0 from the origin.
//! Once it's that far out it's never coming back.  That count is the
//! "rate" we paint with.

use num::Complex;

/// The most iterations we'll ever spend on one point.  Also the rate
/// reported for points that never escape, which conveniently is the
/// top of a byte.
pub const MAX_ITERATIONS: u32 = 255;

/// |z| at or beyond this and the orbit is considered to have escaped.
pub const DIVERGENCE_CEILING: f64 = 2.0;

const CEILING_SQR: f64 = DIVERGENCE_CEILING * DIVERGENCE_CEILING;

/// One evaluated point: where it is, and how quickly it escaped.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SampleResult {
    /// The point on the complex plane.
    pub point: Complex<f64>,
    /// Iterations completed before escape, or `MAX_ITERATIONS`.
    pub rate: u32,
}

impl SampleResult {
    /// Pairs a point with an already-known rate.  Used for averaged
    /// results, where the rate didn't come from `escape_rate` directly.
    pub fn new(point: Complex<f64>, rate: u32) -> Self {
        SampleResult { point, rate }
    }
}

/// Iterates `z = z² + c`, starting from `z = c`, and reports how many
/// iterations were completed before `|z|` reached the divergence
/// ceiling.  Points that are already outside the ceiling have a rate of
/// zero; points that never escape have a rate of `MAX_ITERATIONS`.
pub fn escape_rate(point: Complex<f64>) -> SampleResult {
    let mut z = point;
    for i in 0..MAX_ITERATIONS {
        if z.norm_sqr() >= CEILING_SQR {
            return SampleResult::new(point, i);
        }
        z = z * z + point;
    }
    SampleResult::new(point, MAX_ITERATIONS)
}
