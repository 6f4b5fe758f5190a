// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Splits the image into column bands and renders each on its own
//! thread.
//!
//! Every worker gets its own sampler and its own cache, and renders its
//! band into a private buffer without talking to anyone.  When it's
//! done it takes the canvas lock once, copies its whole band in, and
//! lets go.  Bands never overlap, so the order they land in doesn't
//! matter.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use itertools::iproduct;

use crate::cache::{CacheStats, SampleCache};
use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::planes::{Pixel, PlaneMapper};
use crate::sampler::{AdaptiveSampler, Edges};

/// A contiguous run of columns, full height, rendered by one worker.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Band {
    /// Which band this is, counting from the left.
    pub index: usize,
    /// The first image column in the band.
    pub start: usize,
    /// How many columns the band spans.
    pub width: usize,
}

/// Divides `width` columns among `workers` bands.  The widths add up
/// to `width` and differ by at most one; the leftover columns go to the
/// rightmost bands, so the last band always absorbs the remainder.
/// There are never more bands than columns.
pub fn partition(width: usize, workers: usize) -> Vec<Band> {
    let count = workers.min(width).max(1);
    let base = width / count;
    let wider_from = count - width % count;

    let mut start = 0;
    (0..count)
        .map(|index| {
            let width = if index >= wider_from { base + 1 } else { base };
            let band = Band {
                index,
                start,
                width,
            };
            start += width;
            band
        })
        .collect()
}

/// The shared output raster.  Workers only ever write to it a whole
/// band at a time.
#[derive(Debug)]
pub struct Canvas {
    width: usize,
    height: usize,
    rates: Vec<u8>,
}

impl Canvas {
    /// A blank canvas.
    pub fn new(width: usize, height: usize) -> Self {
        Canvas {
            width,
            height,
            rates: vec![0u8; width * height],
        }
    }

    /// Copies a band's row-major buffer into place.
    pub fn blit(&mut self, band: &Band, buffer: &[u8]) {
        debug_assert_eq!(buffer.len(), band.width * self.height);
        if band.width == 0 {
            return;
        }
        for (row, source) in buffer.chunks(band.width).enumerate() {
            let offset = row * self.width + band.start;
            self.rates[offset..offset + band.width].copy_from_slice(source);
        }
    }

    /// The finished raster.
    pub fn into_rates(self) -> Vec<u8> {
        self.rates
    }
}

/// Counters gathered while rendering, for the log.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Times the escape-time function was actually run.
    pub evaluations: u64,
    /// What the caches were asked to do, summed over all workers.
    pub cache: CacheStats,
    /// Points still sitting in caches when their bands finished.
    pub resident: usize,
}

impl RenderStats {
    /// Folds another band's counters into these.
    pub fn absorb(&mut self, other: &RenderStats) {
        self.evaluations += other.evaluations;
        self.cache += other.cache;
        self.resident += other.resident;
    }
}

impl fmt::Display for RenderStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "points calculated: {} {} final cache size: {}",
            self.evaluations, self.cache, self.resident
        )
    }
}

/// A finished image: one escape rate per pixel, row-major.
#[derive(Clone, Debug)]
pub struct Render {
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
    /// Escape rates, `width * height` of them.
    pub rates: Vec<u8>,
    /// Diagnostics.
    pub stats: RenderStats,
}

/// Renders one band into its own buffer.  Rows are walked top to bottom
/// and columns left to right within each row; the cache hints depend
/// on that order.  Every band samples off the same image-wide lattice,
/// so a pixel comes out the same whichever band it lands in.
pub fn render_band(plane: &PlaneMapper, band: &Band, depth: u32) -> (Vec<u8>, RenderStats) {
    let height = plane.height();
    let lattice = plane.lattice(depth);
    let mut sampler = AdaptiveSampler::new();
    let mut cache = SampleCache::new();
    let mut buffer = Vec::with_capacity(band.width * height);

    for (row, column) in iproduct!(0..height, 0..band.width) {
        let corner = lattice.corner(&Pixel(band.start + column, row));
        let edges = Edges::at(column, row, band.width, height);
        let result = sampler.sample(&mut cache, &lattice, corner, depth, edges);
        buffer.push(result.rate as u8);
    }

    let stats = RenderStats {
        evaluations: sampler.evaluations(),
        cache: cache.stats(),
        resident: cache.len(),
    };
    (buffer, stats)
}

/// Renders the whole image, one worker thread per band, and waits for
/// all of them.
pub fn render(config: &RenderConfig) -> Result<Render, RenderError> {
    config.validate()?;
    let plane = config.plane()?;
    let bands = partition(plane.width(), config.workers);
    debug!(
        "rendering {}x{} at anti-aliasing depth {} in {} band(s)",
        plane.width(),
        plane.height(),
        config.aa_depth,
        bands.len()
    );

    let canvas = Mutex::new(Canvas::new(plane.width(), plane.height()));
    let depth = config.aa_depth;

    let per_band = crossbeam::scope(|scope| -> Result<Vec<RenderStats>, RenderError> {
        let plane = &plane;
        let canvas = &canvas;
        let mut handles = Vec::with_capacity(bands.len());
        for band in &bands {
            let handle = scope
                .builder()
                .name(format!("band-{}", band.index))
                .spawn(move |_| {
                    let (buffer, stats) = render_band(plane, band, depth);
                    canvas
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .blit(band, &buffer);
                    debug!(
                        "band {} (columns {}..{}) done: {}",
                        band.index,
                        band.start,
                        band.start + band.width,
                        stats
                    );
                    stats
                })
                .map_err(|cause| RenderError::Spawn {
                    band: band.index,
                    cause,
                })?;
            handles.push(handle);
        }

        handles
            .into_iter()
            .map(|handle| handle.join().map_err(|_| RenderError::WorkerPanicked))
            .collect()
    })
    .map_err(|_| RenderError::WorkerPanicked)??;

    let mut stats = RenderStats::default();
    for band in &per_band {
        stats.absorb(band);
    }

    Ok(Render {
        width: plane.width(),
        height: plane.height(),
        rates: canvas
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .into_rates(),
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planes::Viewport;

    // Every coordinate in this plane is a short dyadic fraction, so the
    // arithmetic is exact and shared corners always meet.
    fn exact_plane() -> PlaneMapper {
        PlaneMapper::new(8, 4, Viewport::new(-2.0, 1.0, 2.0, -1.0)).unwrap()
    }

    // Tenths and fifths all the way, and the imaginary axis runs
    // through the middle of it.
    fn inexact_plane(width: usize, height: usize) -> PlaneMapper {
        PlaneMapper::new(width, height, Viewport::new(-2.0, 1.2, 1.0, -0.8)).unwrap()
    }

    fn distinct_points(width: usize, height: usize, depth: u32) -> u64 {
        let n = 1usize << (depth - 1);
        let corners = (width * n + 1) * (height * n + 1);
        let centers = width * height * n * n;
        (corners + centers) as u64
    }

    #[test]
    fn partition_covers_the_width() {
        for &(width, workers) in &[(10, 4), (1024, 3), (7, 7), (5, 1), (100, 16)] {
            let bands = partition(width, workers);
            assert_eq!(bands.len(), workers);
            assert_eq!(bands.iter().map(|b| b.width).sum::<usize>(), width);
            let min = bands.iter().map(|b| b.width).min().unwrap();
            let max = bands.iter().map(|b| b.width).max().unwrap();
            assert!(max - min <= 1);
            assert_eq!(bands.last().unwrap().width, max);
            for pair in bands.windows(2) {
                assert_eq!(pair[0].start + pair[0].width, pair[1].start);
            }
        }
    }

    #[test]
    fn partition_puts_the_remainder_on_the_right() {
        let widths: Vec<usize> = partition(10, 4).iter().map(|b| b.width).collect();
        assert_eq!(widths, vec![2, 2, 3, 3]);
    }

    #[test]
    fn partition_never_makes_empty_bands() {
        let bands = partition(3, 8);
        assert_eq!(bands.len(), 3);
        assert!(bands.iter().all(|b| b.width == 1));
    }

    #[test]
    fn blit_lands_in_the_right_columns() {
        let mut canvas = Canvas::new(4, 2);
        let band = Band {
            index: 1,
            start: 1,
            width: 2,
        };
        canvas.blit(&band, &[1, 2, 3, 4]);
        assert_eq!(canvas.into_rates(), vec![0, 1, 2, 0, 0, 3, 4, 0]);
    }

    #[test]
    #[should_panic]
    fn blit_rejects_a_short_buffer() {
        let mut canvas = Canvas::new(4, 2);
        let band = Band {
            index: 0,
            start: 0,
            width: 2,
        };
        canvas.blit(&band, &[1, 2, 3]);
    }

    #[test]
    fn band_cache_drains_at_every_depth() {
        let plane = exact_plane();
        let band = Band {
            index: 0,
            start: 0,
            width: 8,
        };
        for depth in 1..=3 {
            let (buffer, stats) = render_band(&plane, &band, depth);
            assert_eq!(buffer.len(), 32);
            assert_eq!(stats.resident, 0, "depth {}", depth);
            assert_eq!(stats.evaluations, distinct_points(8, 4, depth), "depth {}", depth);
            // Every miss was a first use, and every stored point was taken
            // back out exactly once.
            assert_eq!(stats.cache.misses, stats.cache.puts, "depth {}", depth);
            assert_eq!(stats.cache.removals, stats.cache.puts, "depth {}", depth);
        }
    }

    #[test]
    fn narrow_bands_drain_too() {
        let plane = exact_plane();
        for band in partition(8, 3) {
            let (_, stats) = render_band(&plane, &band, 2);
            assert_eq!(stats.resident, 0);
            assert_eq!(stats.evaluations, distinct_points(band.width, 4, 2));
        }
    }

    #[test]
    fn band_cache_drains_on_an_inexact_plane() {
        for &(width, height, depth) in &[(300, 200, 1), (97, 61, 1), (97, 61, 2), (40, 30, 3)] {
            let plane = inexact_plane(width, height);
            let band = Band {
                index: 0,
                start: 0,
                width,
            };
            let (_, stats) = render_band(&plane, &band, depth);
            let shape = format!("{}x{} at depth {}", width, height, depth);
            assert_eq!(stats.resident, 0, "{}", shape);
            assert_eq!(stats.evaluations, distinct_points(width, height, depth), "{}", shape);
            assert_eq!(stats.cache.misses, stats.cache.puts, "{}", shape);
            assert_eq!(stats.cache.removals, stats.cache.puts, "{}", shape);
        }
    }

    #[test]
    fn inexact_bands_drain_too() {
        let plane = inexact_plane(97, 61);
        for band in partition(97, 4) {
            let (_, stats) = render_band(&plane, &band, 2);
            assert_eq!(stats.resident, 0, "band {}", band.index);
            assert_eq!(stats.evaluations, distinct_points(band.width, 61, 2));
        }
    }

    #[test]
    fn depth_zero_leaves_the_cache_alone() {
        let plane = exact_plane();
        let band = Band {
            index: 0,
            start: 0,
            width: 8,
        };
        let (_, stats) = render_band(&plane, &band, 0);
        assert_eq!(stats.evaluations, 32);
        assert_eq!(stats.cache, CacheStats::default());
    }

    #[test]
    fn bands_match_a_single_worker() {
        let base = RenderConfig {
            width: 32,
            height: 16,
            viewport: Viewport::new(-2.0, 1.0, 2.0, -1.0),
            aa_depth: 2,
            workers: 1,
        };
        let single = render(&base).unwrap();
        assert_eq!(single.stats.resident, 0);
        for &workers in &[2, 3, 5, 32, 64] {
            let banded = render(&RenderConfig { workers, ..base }).unwrap();
            assert_eq!(banded.rates, single.rates, "{} workers", workers);
            assert_eq!(banded.stats.resident, 0);
        }
    }

    #[test]
    fn inexact_bands_match_a_single_worker() {
        let base = RenderConfig {
            width: 97,
            height: 61,
            viewport: Viewport::new(-2.0, 1.2, 1.0, -0.8),
            aa_depth: 2,
            workers: 1,
        };
        let single = render(&base).unwrap();
        for &workers in &[2, 3, 7] {
            let banded = render(&RenderConfig { workers, ..base }).unwrap();
            assert_eq!(banded.rates, single.rates, "{} workers", workers);
            assert_eq!(banded.stats.resident, 0);
        }
    }

    #[test]
    fn render_rejects_bad_config() {
        let config = RenderConfig {
            workers: 0,
            ..RenderConfig::default()
        };
        assert!(render(&config).is_err());
    }
}
