#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Mandelbrot renderer
//!
//! The Mandelbrot set is the set of points on the complex plane that,
//! when repeatedly squared and added back to themselves, never run off
//! to infinity.  For the points that do run off, how *quickly* they go
//! is the number used to render the image.
//!
//! Sampling each pixel once at its corner gives jagged edges, so this
//! renderer can anti-alias by sampling each pixel's corners and center
//! and averaging them, recursively splitting the pixel into quadrants
//! for higher quality.  Most of those corners are shared with a
//! neighbouring pixel, so each worker keeps a small cache that holds a
//! corner from its first use to its last and no longer.
//!
//! The image is cut into vertical bands, one per worker thread, and the
//! bands are stitched back together at the end.
//!
//! ```no_run
//! use mandelbrot::{render, RenderConfig};
//!
//! let config = RenderConfig { workers: 4, ..RenderConfig::default() };
//! let image = render(&config).unwrap();
//! assert_eq!(image.rates.len(), 1024 * 768);
//! ```

extern crate crossbeam;
extern crate failure;
extern crate image;
extern crate itertools;
#[macro_use]
extern crate log;
extern crate num;

pub mod cache;
pub mod config;
pub mod error;
pub mod escape;
pub mod palette;
pub mod planes;
pub mod sampler;
pub mod scheduler;

pub use config::{RenderConfig, MAX_AA_DEPTH};
pub use error::RenderError;
pub use escape::{escape_rate, SampleResult, MAX_ITERATIONS};
pub use palette::Palette;
pub use planes::{PlaneMapper, Viewport};
pub use scheduler::{render, Render, RenderStats};
