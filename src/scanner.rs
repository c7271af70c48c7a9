// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Coarse sampling plus bisection over a whole window.
//!
//! The window is sampled once at a fixed cadence and unwrapped once. Each of
//! the 24 term degrees is then searched on every 360° branch the track spans,
//! so a window longer than a year yields the same term more than once.

use qtty::{Day, Days, Degrees, Hours};

use crate::crossing::{CrossingFinder, DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE_DEG};
use crate::ephemeris::EphemerisProvider;
use crate::error::ScanError;
use crate::term::SolarTermName;
use crate::unwrap::{Sample, UnwrappedTrack};
use crate::{Period, Time, UT};

/// Largest accepted sampling step.
pub const MAX_STEP_HOURS: f64 = 48.0;

/// Smallest accepted sampling step, one minute.
pub const MIN_STEP_HOURS: f64 = 1.0 / 60.0;

/// Whether `step_hours` lies in `[MIN_STEP_HOURS, MAX_STEP_HOURS]`.
pub fn is_valid_step(step_hours: f64) -> bool {
    (MIN_STEP_HOURS..=MAX_STEP_HOURS).contains(&step_hours)
}

/// Largest unwrapped motion tolerated between two samples.
const MAX_SAMPLE_MOTION_DEG: f64 = 90.0;

/// Sampling and refinement parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanConfig {
    pub step: Hours,
    /// Kept between the window and the edges of provider coverage.
    pub coverage_margin: Days,
    pub tolerance: Degrees,
    pub max_iterations: u32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            step: Hours::new(6.0),
            coverage_margin: Days::new(3.0),
            tolerance: Degrees::new(DEFAULT_TOLERANCE_DEG),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl ScanConfig {
    pub fn with_step(mut self, step: Hours) -> Self {
        self.step = step;
        self
    }
}

/// One located term crossing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TermHit {
    pub name: SolarTermName,
    pub instant: Time<UT>,
}

/// Finds every term crossing inside a window.
#[derive(Debug, Clone, Copy)]
pub struct SolarTermScanner<P> {
    provider: P,
    config: ScanConfig,
}

impl<P: EphemerisProvider> SolarTermScanner<P> {
    pub fn new(provider: P) -> Self {
        Self::with_config(provider, ScanConfig::default())
    }

    pub fn with_config(provider: P, config: ScanConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// All term crossings in `window`, sorted by instant.
    ///
    /// The window is first clamped to the provider coverage minus the
    /// configured margin.
    pub fn scan(&self, window: Period<UT>) -> Result<Vec<TermHit>, ScanError> {
        let step_hours = self.config.step.value();
        if !is_valid_step(step_hours) {
            return Err(ScanError::InvalidStep {
                step_hours,
                min_hours: MIN_STEP_HOURS,
                max_hours: MAX_STEP_HOURS,
            });
        }

        let window = self.clamp(window)?;
        let raw = self.sample(window, self.config.step.to::<Day>())?;
        let track = UnwrappedTrack::from_raw(&raw);

        let widest = track.max_step();
        if widest.value() > MAX_SAMPLE_MOTION_DEG {
            return Err(ScanError::BracketNotFound {
                degree: 0,
                reason: format!(
                    "longitude moved {:.1}° between samples; step {step_hours} h is too coarse",
                    widest.value()
                ),
            });
        }

        let (Some(lo), Some(hi)) = (track.min(), track.max()) else {
            return Ok(Vec::new());
        };

        let finder = CrossingFinder::new(&self.provider)
            .with_tolerance(self.config.tolerance)
            .with_max_iterations(self.config.max_iterations);

        let mut hits = Vec::new();
        for name in SolarTermName::ALL {
            let degree = f64::from(name.degree());
            let k_min = ((lo.value() - degree) / 360.0).ceil() as i64;
            let k_max = ((hi.value() - degree) / 360.0).floor() as i64;
            for k in k_min..=k_max {
                let target = Degrees::new(degree + 360.0 * k as f64);
                let (left, right) =
                    track
                        .bracket(target)
                        .ok_or_else(|| ScanError::BracketNotFound {
                            degree: name.degree(),
                            reason: format!("no sample pair straddles {:.3}°", target.value()),
                        })?;
                let instant = finder.find(left, right, target)?.ok_or_else(|| {
                    ScanError::BracketNotFound {
                        degree: name.degree(),
                        reason: format!(
                            "bracket {:.6}°..{:.6}° does not contain {:.6}°",
                            left.longitude.value(),
                            right.longitude.value(),
                            target.value()
                        ),
                    }
                })?;
                hits.push(TermHit { name, instant });
            }
        }

        hits.sort_by(|a, b| a.instant.value().total_cmp(&b.instant.value()));
        log::debug!("scan {window}: {} crossings from {} samples", hits.len(), raw.len());
        Ok(hits)
    }

    fn clamp(&self, window: Period<UT>) -> Result<Period<UT>, ScanError> {
        let usable = self.provider.coverage().shrink(self.config.coverage_margin);
        let clamped = usable
            .intersection(&window)
            .filter(|p| p.is_proper())
            .ok_or_else(|| ScanError::RangeExceeded {
                requested: window.to_string(),
                coverage: usable.to_string(),
            })?;
        if clamped != window {
            log::warn!("scan window {window} clamped to {clamped}");
        }
        Ok(clamped)
    }

    /// Samples at `start + i·step`, with the last one exactly at `end`.
    fn sample(&self, window: Period<UT>, step: Days) -> Result<Vec<Sample>, ScanError> {
        let count = (window.duration().value() / step.value()).ceil() as usize;
        let mut samples = Vec::with_capacity(count + 1);
        for i in 0..count {
            let instant = window.start + Days::new(step.value() * i as f64);
            if instant >= window.end {
                break;
            }
            samples.push(self.sample_at(instant)?);
        }
        samples.push(self.sample_at(window.end)?);
        Ok(samples)
    }

    fn sample_at(&self, instant: Time<UT>) -> Result<Sample, ScanError> {
        let longitude = self.provider.apparent_solar_longitude(instant)?;
        Ok(Sample::new(instant, longitude))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LinearSun;
    use qtty::{Second, Seconds};

    const EPOCH: f64 = 2_460_000.0;

    fn mean_sun() -> LinearSun {
        LinearSun::new(Time::new(EPOCH), Degrees::new(280.0), 360.0 / 365.242_19)
    }

    fn window(from: f64, to: f64) -> Period<UT> {
        Period::new(Time::new(EPOCH + from), Time::new(EPOCH + to))
    }

    #[test]
    fn linear_year_yields_every_term_once() {
        let sun = mean_sun();
        let hits = SolarTermScanner::new(&sun).scan(window(0.0, 365.0)).unwrap();
        assert_eq!(hits.len(), 24);
        let mut names: Vec<_> = hits.iter().map(|h| h.name).collect();
        names.sort_by_key(|n| n.degree());
        names.dedup();
        assert_eq!(names.len(), 24);
        assert!(hits.windows(2).all(|w| w[0].instant < w[1].instant));
    }

    #[test]
    fn crossings_match_closed_form() {
        let sun = mean_sun();
        let hits = SolarTermScanner::new(&sun).scan(window(0.0, 200.0)).unwrap();
        assert!(!hits.is_empty());
        for hit in &hits {
            // first branch above the phase for each degree
            let degree = f64::from(hit.name.degree());
            let unwrapped = if degree < 280.0 { degree + 360.0 } else { degree };
            let want = sun.instant_of(Degrees::new(unwrapped));
            let error = (hit.instant - want).abs().to::<Second>();
            assert!(error < Seconds::new(0.05), "{:?}: {error}", hit.name);
        }
    }

    #[test]
    fn long_window_repeats_terms() {
        let sun = mean_sun();
        let hits = SolarTermScanner::new(&sun).scan(window(0.0, 800.0)).unwrap();
        let solstices = hits
            .iter()
            .filter(|h| h.name == SolarTermName::WinterSolstice)
            .count();
        assert_eq!(solstices, 2);
    }

    #[test]
    fn window_outside_coverage_is_range_exceeded() {
        let sun = mean_sun().with_coverage(window(0.0, 100.0));
        let err = SolarTermScanner::new(&sun)
            .scan(window(200.0, 300.0))
            .unwrap_err();
        assert!(matches!(err, ScanError::RangeExceeded { .. }));
    }

    #[test]
    fn window_within_margin_is_range_exceeded() {
        let sun = mean_sun().with_coverage(window(0.0, 5.0));
        let err = SolarTermScanner::new(&sun)
            .scan(window(0.0, 5.0))
            .unwrap_err();
        assert!(matches!(err, ScanError::RangeExceeded { .. }));
    }

    #[test]
    fn partially_covered_window_is_clamped() {
        let sun = mean_sun().with_coverage(window(-10.0, 100.0));
        let hits = SolarTermScanner::new(&sun).scan(window(0.0, 365.0)).unwrap();
        let limit = Time::<UT>::new(EPOCH + 97.0);
        assert!(!hits.is_empty());
        assert!(hits.iter().all(|h| h.instant <= limit));
    }

    #[test]
    fn oversized_step_is_rejected() {
        let sun = mean_sun();
        let config = ScanConfig::default().with_step(Hours::new(72.0));
        let err = SolarTermScanner::with_config(&sun, config)
            .scan(window(0.0, 365.0))
            .unwrap_err();
        assert!(matches!(err, ScanError::InvalidStep { step_hours, .. } if step_hours == 72.0));
    }

    #[test]
    fn sub_minute_step_is_rejected_before_sampling() {
        let sun = mean_sun();
        let config = ScanConfig::default().with_step(Hours::new(1e-6));
        let err = SolarTermScanner::with_config(&sun, config)
            .scan(window(0.0, 365.0))
            .unwrap_err();
        assert!(matches!(err, ScanError::InvalidStep { .. }));
        assert!(is_valid_step(MIN_STEP_HOURS));
        assert!(!is_valid_step(f64::NAN));
    }

    #[test]
    fn fast_track_trips_the_cadence_guard() {
        // 200°/day sampled every 12 h moves 100° per step
        let sun = LinearSun::new(Time::new(EPOCH), Degrees::new(0.0), 200.0);
        let config = ScanConfig::default().with_step(Hours::new(12.0));
        let err = SolarTermScanner::with_config(&sun, config)
            .scan(window(0.0, 10.0))
            .unwrap_err();
        assert!(matches!(err, ScanError::BracketNotFound { .. }));
    }
}
