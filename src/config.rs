// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The knobs a render is run with.

use crate::error::RenderError;
use crate::planes::{PlaneMapper, Viewport};

/// The deepest anti-aliasing the renderer accepts.  Each level
/// quadruples the work per pixel.
pub const MAX_AA_DEPTH: u32 = 8;

/// Everything the renderer needs to know to produce an image.  Once
/// set, this should not be mutated mid-render; the workers all borrow
/// it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RenderConfig {
    /// Output width in pixels.
    pub width: usize,
    /// Output height in pixels.
    pub height: usize,
    /// The region of the complex plane to draw.
    pub viewport: Viewport,
    /// Anti-aliasing depth.  Zero samples each pixel once at its upper
    /// left corner; one averages the four corners and the center; each
    /// level past that splits the pixel into quadrants first.
    pub aa_depth: u32,
    /// Number of column bands, and so of worker threads.
    pub workers: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            width: 1024,
            height: 768,
            viewport: Viewport::default(),
            aa_depth: 1,
            workers: 1,
        }
    }
}

impl RenderConfig {
    /// Checks the things the renderer can't work around: a non-empty
    /// image, a viewport the right way up, a depth it can sample at, and
    /// at least one worker.
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.workers == 0 {
            return Err(RenderError::NoWorkers);
        }
        if self.aa_depth > MAX_AA_DEPTH {
            return Err(RenderError::TooDeep {
                depth: self.aa_depth,
                max: MAX_AA_DEPTH,
            });
        }
        self.plane().map(|_| ())
    }

    /// The pixel-to-point mapping for this configuration.
    pub fn plane(&self) -> Result<PlaneMapper, RenderError> {
        PlaneMapper::new(self.width, self.height, self.viewport)
    }
}
