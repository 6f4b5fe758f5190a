// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the PlaneMapper struct, which describes a relationship
//! between a rectangle on the integral plane with an origin at 0,0 in
//! the upper left, and a rectangle on the complex plane defined by its
//! upper-left and lower-right corners.
//!
//! Screen rows count downward while the imaginary axis counts upward,
//! so walking down the image walks *down* the imaginary axis.  The
//! per-pixel step carries that as a negative imaginary part.
use num::Complex;

use crate::error::RenderError;

/// Describes the width and height of an integral plane that is assumed
/// to start at 0,0.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IntegralPlane(pub usize, pub usize);

/// Describes the column and row of a pixel.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub usize, pub usize);

/// The region of the complex plane we're looking at, named by its
/// upper-left (minimum real, maximum imaginary) and lower-right
/// (maximum real, minimum imaginary) corners.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    /// The point drawn at the top left of the image.
    pub upper_left: Complex<f64>,
    /// The point drawn at the bottom right of the image.
    pub lower_right: Complex<f64>,
}

impl Viewport {
    /// Builds a viewport from the four bounds in the order people
    /// usually write them: minX, maxY, maxX, minY.
    pub fn new(min_x: f64, max_y: f64, max_x: f64, min_y: f64) -> Self {
        Viewport {
            upper_left: Complex::new(min_x, max_y),
            lower_right: Complex::new(max_x, min_y),
        }
    }

    /// True if the upper-left corner really is above and to the left.
    pub fn is_well_formed(&self) -> bool {
        self.upper_left.re < self.lower_right.re && self.upper_left.im > self.lower_right.im
    }
}

impl Default for Viewport {
    /// The whole set, in a 4:3 frame.
    fn default() -> Self {
        Viewport::new(-2.0, 1.125, 1.0, -1.125)
    }
}

/// Contains the definitions of two planes: an integral cartesian plane,
/// and a complex cartesian plane.  Maps pixels from one to points on
/// the other.
#[derive(Copy, Clone, Debug)]
pub struct PlaneMapper {
    /// The size of the image.
    pub integral_plane: IntegralPlane,
    /// The region of the complex plane the image covers.
    pub viewport: Viewport,
    // How far one pixel reaches on the complex plane.  The imaginary
    // part is negative.
    step: Complex<f64>,
}

impl PlaneMapper {
    /// Constructor.  Takes the image size and the viewport it should
    /// show.
    pub fn new(
        width: usize,
        height: usize,
        viewport: Viewport,
    ) -> Result<PlaneMapper, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::EmptyImage { width, height });
        }

        if !viewport.is_well_formed() {
            return Err(RenderError::InvertedViewport);
        }

        let region = viewport.lower_right - viewport.upper_left;
        let step = Complex::new(region.re / (width as f64), region.im / (height as f64));

        Ok(PlaneMapper {
            integral_plane: IntegralPlane(width, height),
            viewport,
            step,
        })
    }

    /// Width of the image in pixels.
    pub fn width(&self) -> usize {
        self.integral_plane.0
    }

    /// Height of the image in pixels.
    pub fn height(&self) -> usize {
        self.integral_plane.1
    }

    /// The lattice that sampling at anti-aliasing `depth` lands on: each
    /// pixel is cut `2^depth` ways along each axis, so every corner and
    /// center the sampler visits is a node.  `depth` must be small enough
    /// to shift by.
    pub fn lattice(&self, depth: u32) -> Lattice {
        let scale = 1usize << depth;
        Lattice {
            origin: self.viewport.upper_left,
            spacing: self.step / (scale as f64),
            scale,
        }
    }
}

/// A vertex of a `Lattice`: column and row, counting from the upper
/// left of the image.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Node(pub usize, pub usize);

/// A grid laid over the viewport, `scale` cells to a pixel along each
/// axis.
///
/// A node's coordinates are always one multiply and one add off the
/// origin, never a sum of steps, so every pixel that shares a corner
/// gets exactly the same bits for it.  The spacing is the pixel step
/// divided by a power of two, which is exact, so the node at a pixel's
/// corner is the same point at every depth.
#[derive(Copy, Clone, Debug)]
pub struct Lattice {
    origin: Complex<f64>,
    spacing: Complex<f64>,
    scale: usize,
}

impl Lattice {
    /// The node at a pixel's upper-left corner.
    pub fn corner(&self, pixel: &Pixel) -> Node {
        Node(pixel.0 * self.scale, pixel.1 * self.scale)
    }

    /// Where a node sits on the complex plane.
    pub fn point(&self, node: Node) -> Complex<f64> {
        Complex::new(
            self.origin.re + (node.0 as f64) * self.spacing.re,
            self.origin.im + (node.1 as f64) * self.spacing.im,
        )
    }
}
