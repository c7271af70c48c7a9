// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Bisection for the instant an unwrapped longitude reaches a target.

use qtty::{Day, Days, Degrees, Seconds};

use crate::ephemeris::EphemerisProvider;
use crate::error::EphemerisError;
use crate::unwrap::Sample;
use crate::{Time, UT};

/// Default angular tolerance, degrees.
pub const DEFAULT_TOLERANCE_DEG: f64 = 1e-7;

/// Default bisection budget.
pub const DEFAULT_MAX_ITERATIONS: u32 = 80;

/// Re-attach a raw `[0, 360)` longitude to the 360° branch nearest `reference`.
///
/// ```
/// use ganji::crossing::anchor_to;
/// use qtty::Degrees;
///
/// let u = anchor_to(Degrees::new(2.0), Degrees::new(719.0));
/// assert_eq!(u, Degrees::new(722.0));
/// ```
pub fn anchor_to(raw: Degrees, reference: Degrees) -> Degrees {
    let k = ((reference - raw).value() / 360.0).round();
    Degrees::new(raw.value() + 360.0 * k)
}

/// Refines a bracketing sample pair down to a single crossing instant.
#[derive(Debug, Clone, Copy)]
pub struct CrossingFinder<P> {
    provider: P,
    tolerance: Degrees,
    max_iterations: u32,
    min_bracket: Days,
}

impl<P: EphemerisProvider> CrossingFinder<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            tolerance: Degrees::new(DEFAULT_TOLERANCE_DEG),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            min_bracket: Seconds::new(1e-3).to::<Day>(),
        }
    }

    pub fn with_tolerance(mut self, tolerance: Degrees) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn tolerance(&self) -> Degrees {
        self.tolerance
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Instant in `[left.instant, right.instant]` where the unwrapped
    /// longitude equals `target`.
    ///
    /// `Ok(None)` means the pair does not bracket the target. Every midpoint
    /// is re-attached to the branch of the current left endpoint, never to
    /// the branch of the raw value alone.
    pub fn find(
        &self,
        left: Sample,
        right: Sample,
        target: Degrees,
    ) -> Result<Option<Time<UT>>, EphemerisError> {
        if left.instant > right.instant
            || target < left.longitude
            || target > right.longitude
        {
            return Ok(None);
        }
        if (left.longitude - target).abs() <= self.tolerance {
            return Ok(Some(left.instant));
        }
        if (right.longitude - target).abs() <= self.tolerance {
            return Ok(Some(right.instant));
        }

        let mut lo = left;
        let mut hi = right;
        for _ in 0..self.max_iterations {
            let mid = lo.instant.mean(hi.instant);
            let raw = self.provider.apparent_solar_longitude(mid)?;
            let unwrapped = anchor_to(raw, lo.longitude);

            if (unwrapped - target).abs() <= self.tolerance {
                return Ok(Some(mid));
            }
            if unwrapped < target {
                lo = Sample::new(mid, unwrapped);
            } else {
                hi = Sample::new(mid, unwrapped);
            }
            if hi.instant - lo.instant < self.min_bracket {
                break;
            }
        }
        Ok(Some(lo.instant.mean(hi.instant)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LinearSun;
    use qtty::Second;

    fn sun() -> LinearSun {
        // roughly the real mean rate, starting just below the wrap
        LinearSun::new(Time::new(2_460_000.0), Degrees::new(350.0), 0.985_6)
    }

    fn sample(sun: &LinearSun, jd: f64) -> Sample {
        let t = Time::<UT>::new(jd);
        Sample::new(t, sun.unwrapped_at(t))
    }

    #[test]
    fn anchor_picks_nearest_branch() {
        assert_eq!(anchor_to(Degrees::new(359.0), Degrees::new(361.0)), Degrees::new(359.0));
        assert_eq!(anchor_to(Degrees::new(1.0), Degrees::new(359.5)), Degrees::new(361.0));
        assert_eq!(anchor_to(Degrees::new(10.0), Degrees::new(10.0)), Degrees::new(10.0));
    }

    #[test]
    fn finds_crossing_across_the_wrap() {
        let sun = sun();
        let finder = CrossingFinder::new(&sun);
        let left = sample(&sun, 2_460_010.0);
        let right = sample(&sun, 2_460_010.25);
        let target = Degrees::new(360.0);
        let want = sun.instant_of(target);
        assert!(left.instant < want && want < right.instant);

        let got = finder.find(left, right, target).unwrap().unwrap();
        assert!((got - want).abs().to::<Second>() < Seconds::new(0.05));
    }

    #[test]
    fn target_outside_bracket_is_none() {
        let sun = sun();
        let finder = CrossingFinder::new(&sun);
        let left = sample(&sun, 2_460_000.0);
        let right = sample(&sun, 2_460_000.25);
        assert_eq!(finder.find(left, right, Degrees::new(355.0)).unwrap(), None);
        assert_eq!(finder.find(left, right, Degrees::new(349.0)).unwrap(), None);
    }

    #[test]
    fn endpoint_hit_returns_endpoint() {
        let sun = sun();
        let finder = CrossingFinder::new(&sun);
        let left = sample(&sun, 2_460_000.0);
        let right = sample(&sun, 2_460_000.25);
        let got = finder.find(left, right, left.longitude).unwrap();
        assert_eq!(got, Some(left.instant));
    }

    #[test]
    fn provider_failure_propagates() {
        let sun = sun().with_coverage(crate::Period::new(
            Time::new(2_460_000.0),
            Time::new(2_460_000.1),
        ));
        let finder = CrossingFinder::new(&sun);
        let left = sample(&sun, 2_460_000.0);
        let right = sample(&sun, 2_460_001.0);
        let target = Degrees::new(350.9);
        assert!(finder.find(left, right, target).is_err());
    }
}
