// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The per-worker sample cache.
//!
//! When anti-aliasing is on, every pixel samples its own four corners,
//! and every one of those corners (except at the edges of the image) is
//! also a corner of up to three other pixels.  Rather than compute the
//! same point four times, the first pixel to need a corner stores it,
//! the middle ones read it, and the last one takes it out of the cache.
//! The sampler decides which of those is happening; this module just
//! does what it's told and keeps count.
//!
//! Points are keyed by a quantized form of their coordinates, with the
//! low byte of each mantissa dropped and negative zero folded into
//! zero.  The sampler already computes a shared corner the same way
//! from every pixel that uses it, so the key only has to be stable, not
//! forgiving.

use std::collections::HashMap;
use std::fmt;
use std::ops::AddAssign;

use num::Complex;

use crate::escape::SampleResult;

const SIGN_MASK: u64 = 0x8000_0000_0000_0000;
const EXPONENT_MASK: u64 = 0x7ff0_0000_0000_0000;
// The low byte of the mantissa is discarded.
const MANTISSA_MASK: u64 = 0x000f_ffff_ffff_ff00;

/// What the cache should do with a particular sample point.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CacheHint {
    /// Don't look, don't store.  The point is used exactly once.
    Skip,
    /// This is the last use of the point: hand it back and forget it.
    Remove,
    /// Look first; if it has to be computed, keep it for later.
    Store,
}

/// A coordinate pair reduced to something hashable and tolerant of
/// low-order floating-point noise.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey(u128);

impl CacheKey {
    /// Quantizes both halves of the point and packs them into one key,
    /// real part in the high word.
    pub fn new(point: Complex<f64>) -> Self {
        CacheKey((u128::from(quantize(point.re)) << 64) | u128::from(quantize(point.im)))
    }
}

/// Splits an f64 into its sign, exponent and mantissa fields, drops the
/// low byte of the mantissa, and reassembles.  Negative zero is folded
/// into positive zero first.
fn quantize(value: f64) -> u64 {
    let bits = if value == 0.0 { 0 } else { value.to_bits() };
    let sign = bits & SIGN_MASK;
    let exponent = bits & EXPONENT_MASK;
    let mantissa = bits & MANTISSA_MASK;
    sign | exponent | mantissa
}

/// Running totals of what the cache has been asked to do.  These are
/// for diagnostics only; nothing in the renderer reads them back.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups that found their point and left it in place.
    pub hits: u64,
    /// Lookups that didn't find their point.
    pub misses: u64,
    /// Lookups that found their point and evicted it.
    pub removals: u64,
    /// Points inserted.
    pub puts: u64,
    /// Lookups that bypassed the cache entirely.
    pub skips: u64,
}

impl AddAssign for CacheStats {
    fn add_assign(&mut self, other: CacheStats) {
        self.hits += other.hits;
        self.misses += other.misses;
        self.removals += other.removals;
        self.puts += other.puts;
        self.skips += other.skips;
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "hits: {} misses: {} removals: {} puts: {} skips: {}",
            self.hits, self.misses, self.removals, self.puts, self.skips
        )
    }
}

/// A map from quantized coordinates to computed samples.  Each worker
/// owns exactly one of these for the duration of its band, and it is
/// never shared.
#[derive(Debug, Default)]
pub struct SampleCache {
    points: HashMap<CacheKey, SampleResult>,
    stats: CacheStats,
}

impl SampleCache {
    /// An empty cache.
    pub fn new() -> Self {
        SampleCache::default()
    }

    /// Looks up a point according to the hint.  `Skip` never finds
    /// anything.  A hit under `Remove` evicts the entry; a hit under any
    /// other hint leaves it in place.  `None` means the caller has to
    /// compute the point itself.
    pub fn lookup(&mut self, key: CacheKey, hint: CacheHint) -> Option<SampleResult> {
        match hint {
            CacheHint::Skip => {
                self.stats.skips += 1;
                None
            }
            CacheHint::Remove => match self.points.remove(&key) {
                Some(found) => {
                    self.stats.removals += 1;
                    Some(found)
                }
                None => {
                    self.stats.misses += 1;
                    None
                }
            },
            CacheHint::Store => match self.points.get(&key) {
                Some(found) => {
                    self.stats.hits += 1;
                    Some(*found)
                }
                None => {
                    self.stats.misses += 1;
                    None
                }
            },
        }
    }

    /// Inserts the result, but only if the hint says to keep it.
    pub fn store(&mut self, key: CacheKey, result: SampleResult, hint: CacheHint) {
        if hint == CacheHint::Store {
            self.stats.puts += 1;
            self.points.insert(key, result);
        }
    }

    /// The counters so far.
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// How many points are currently held.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if no points are held.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escape::escape_rate;

    fn sample(re: f64, im: f64) -> (CacheKey, SampleResult) {
        let point = Complex::new(re, im);
        (CacheKey::new(point), escape_rate(point))
    }

    #[test]
    fn keys_ignore_low_order_noise() {
        let a = 0.75_f64;
        let b = f64::from_bits(a.to_bits() + 3);
        assert_ne!(a, b);
        assert_eq!(
            CacheKey::new(Complex::new(a, -1.5)),
            CacheKey::new(Complex::new(b, -1.5))
        );
    }

    #[test]
    fn keys_distinguish_neighbouring_pixels() {
        let step = 3.0 / 1024.0;
        let a = CacheKey::new(Complex::new(-2.0 + step * 10.0, 0.5));
        let b = CacheKey::new(Complex::new(-2.0 + step * 11.0, 0.5));
        assert_ne!(a, b);
    }

    #[test]
    fn keys_keep_sign_and_axis() {
        let p = CacheKey::new(Complex::new(0.5, 0.25));
        assert_ne!(p, CacheKey::new(Complex::new(-0.5, 0.25)));
        assert_ne!(p, CacheKey::new(Complex::new(0.5, -0.25)));
        assert_ne!(p, CacheKey::new(Complex::new(0.25, 0.5)));
    }

    #[test]
    fn negative_zero_is_zero() {
        assert_eq!(
            CacheKey::new(Complex::new(-0.0, 1.0)),
            CacheKey::new(Complex::new(0.0, 1.0))
        );
    }

    #[test]
    fn skip_never_finds_anything() {
        let mut cache = SampleCache::new();
        let (key, result) = sample(0.1, 0.1);
        cache.store(key, result, CacheHint::Store);
        assert_eq!(cache.lookup(key, CacheHint::Skip), None);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().skips, 1);
    }

    #[test]
    fn store_then_hit_then_remove() {
        let mut cache = SampleCache::new();
        let (key, result) = sample(-0.5, 0.5);

        assert_eq!(cache.lookup(key, CacheHint::Store), None);
        cache.store(key, result, CacheHint::Store);
        assert_eq!(cache.lookup(key, CacheHint::Store), Some(result));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.lookup(key, CacheHint::Remove), Some(result));
        assert!(cache.is_empty());

        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 1,
                misses: 1,
                removals: 1,
                puts: 1,
                skips: 0,
            }
        );
    }

    #[test]
    fn store_is_a_no_op_without_the_store_hint() {
        let mut cache = SampleCache::new();
        let (key, result) = sample(1.0, 1.0);
        cache.store(key, result, CacheHint::Skip);
        cache.store(key, result, CacheHint::Remove);
        assert!(cache.is_empty());
        assert_eq!(cache.stats().puts, 0);
    }

    #[test]
    fn remove_on_a_missing_key_is_a_miss() {
        let mut cache = SampleCache::new();
        let (key, _) = sample(0.0, 0.0);
        assert_eq!(cache.lookup(key, CacheHint::Remove), None);
        assert_eq!(cache.stats().misses, 1);
        assert_eq!(cache.stats().removals, 0);
    }

    #[test]
    fn stats_add_up() {
        let mut total = CacheStats::default();
        total += CacheStats {
            hits: 1,
            misses: 2,
            removals: 3,
            puts: 4,
            skips: 5,
        };
        total += CacheStats {
            hits: 10,
            ..CacheStats::default()
        };
        assert_eq!(total.hits, 11);
        assert_eq!(total.skips, 5);
    }
}
