// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Things that can go wrong before or during a render.  The arithmetic
//! itself is total, so everything here is either a configuration that
//! never should have reached the renderer, or the platform refusing us
//! the threads we asked for.

use failure::Fail;
use std::io;

/// The renderer's error type.
#[derive(Debug, Fail)]
pub enum RenderError {
    /// One of the image dimensions was zero.
    #[fail(display = "Image dimensions must be positive, got {}x{}", width, height)]
    EmptyImage {
        /// Requested width in pixels.
        width: usize,
        /// Requested height in pixels.
        height: usize,
    },

    /// The upper-left corner of the viewport is not above and to the
    /// left of the lower-right corner.
    #[fail(display = "Upper left corner must be above and to the left of the lower right corner")]
    InvertedViewport,

    /// The anti-aliasing depth is past what the sample lattice can
    /// address.
    #[fail(display = "Anti-aliasing depth must be at most {}, got {}", max, depth)]
    TooDeep {
        /// Requested depth.
        depth: u32,
        /// Deepest supported depth.
        max: u32,
    },

    /// Asked to render with no workers at all.
    #[fail(display = "Worker count must be at least 1")]
    NoWorkers,

    /// The platform would not give us a thread for a band.
    #[fail(display = "Could not start the worker for band {}: {}", band, cause)]
    Spawn {
        /// Index of the band whose worker failed to start.
        band: usize,
        /// What the operating system told us.
        #[cause]
        cause: io::Error,
    },

    /// A band worker panicked before it finished its band.
    #[fail(display = "A band worker panicked before completing its band")]
    WorkerPanicked,
}
