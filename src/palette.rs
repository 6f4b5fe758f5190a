// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A 256-entry blue ramp.  Fast escapes are dark, slow escapes are
//! bright, and points that never escaped at all are black.

use image::{Rgb, RgbImage};

use crate::escape::MAX_ITERATIONS;

/// Maps escape rates to colors.
#[derive(Clone, Debug)]
pub struct Palette {
    colors: [Rgb<u8>; 256],
}

impl Default for Palette {
    fn default() -> Self {
        let mut colors = [Rgb([0, 0, 0]); 256];
        for (i, color) in colors.iter_mut().enumerate().take(MAX_ITERATIONS as usize) {
            let i = i as u8;
            *color = Rgb([i / 2, i / 2, i]);
        }
        Palette { colors }
    }
}

impl Palette {
    /// The color for one rate.
    pub fn color(&self, rate: u8) -> Rgb<u8> {
        self.colors[usize::from(rate)]
    }

    /// Paints a whole raster of rates.  Returns `None` if the raster
    /// isn't `width * height` long.
    pub fn paint(&self, rates: &[u8], width: u32, height: u32) -> Option<RgbImage> {
        if rates.len() != (width as usize) * (height as usize) {
            return None;
        }
        Some(RgbImage::from_fn(width, height, |x, y| {
            self.color(rates[(y * width + x) as usize])
        }))
    }
}
