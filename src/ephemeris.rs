// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Solar longitude providers.
//!
//! The root finder only needs one capability: the Sun's apparent geocentric
//! ecliptic longitude at an instant, plus the interval over which that answer
//! can be trusted. [`EphemerisProvider`] is that seam.
//!
//! Two providers ship with the crate:
//!
//! - [`Vsop87Sun`]: VSOP87D Earth plus nutation and aberration, good to
//!   about an arcsecond (a few tens of seconds of solar motion at worst).
//! - [`LinearSun`]: a synthetic constant-rate model whose crossings are known
//!   in closed form, for exercising the root finder.

use chrono::{TimeZone, Utc};
use qtty::{Days, Degrees};

use crate::error::EphemerisError;
use crate::{nutation, vsop87};
use crate::{Period, Time, TT, UT};

/// Source of apparent geocentric solar longitude.
pub trait EphemerisProvider: Send + Sync {
    /// Longitude in `[0, 360)` degrees at `instant`.
    fn apparent_solar_longitude(&self, instant: Time<UT>) -> Result<Degrees, EphemerisError>;

    /// Interval over which [`apparent_solar_longitude`](Self::apparent_solar_longitude)
    /// is valid.
    fn coverage(&self) -> Period<UT>;
}

impl<P: EphemerisProvider + ?Sized> EphemerisProvider for &P {
    fn apparent_solar_longitude(&self, instant: Time<UT>) -> Result<Degrees, EphemerisError> {
        (**self).apparent_solar_longitude(instant)
    }

    fn coverage(&self) -> Period<UT> {
        (**self).coverage()
    }
}

fn check_coverage(coverage: &Period<UT>, instant: Time<UT>) -> Result<(), EphemerisError> {
    if coverage.contains(instant) {
        Ok(())
    } else {
        Err(EphemerisError::OutsideCoverage {
            instant: instant
                .to_utc()
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| instant.to_string()),
            coverage: coverage.to_string(),
        })
    }
}

/// Apparent solar longitude from the VSOP87D Earth series.
///
/// The geometric longitude is moved to the FK5 frame, then nutation
/// (IAU 2000B) and annual aberration are added. Instants arrive on the UT axis
/// and are moved to TT before evaluation. Agrees with published term instants
/// to within a few seconds of time over its default coverage.
#[derive(Debug, Clone, Copy)]
pub struct Vsop87Sun {
    coverage: Period<UT>,
}

/// FK5 correction to the VSOP87 longitude, arcsec.
const FK5_CORRECTION_ARCSEC: f64 = -0.090_33;

/// Constant of aberration, arcsec, divided by the distance in AU.
const ABERRATION_ARCSEC: f64 = -20.489_8;

impl Vsop87Sun {
    pub fn new(coverage: Period<UT>) -> Self {
        Self { coverage }
    }

    /// Longitude at a TT instant, without any coverage check.
    pub fn longitude_tt(jde: Time<TT>) -> Degrees {
        let t = jde.julian_centuries().value();
        let tau = t / 10.0;

        let geometric = vsop87::earth_longitude(tau).to_degrees() + 180.0;
        let corrections = FK5_CORRECTION_ARCSEC
            + nutation::nutation_in_longitude(t)
            + ABERRATION_ARCSEC / vsop87::earth_radius(tau);
        Degrees::new((geometric + corrections / 3_600.0).rem_euclid(360.0))
    }
}

impl Default for Vsop87Sun {
    /// Coverage 1800-01-01 … 2200-01-01 UTC.
    fn default() -> Self {
        let start = Utc.with_ymd_and_hms(1800, 1, 1, 0, 0, 0).single();
        let end = Utc.with_ymd_and_hms(2200, 1, 1, 0, 0, 0).single();
        match (start, end) {
            (Some(start), Some(end)) => Self::new(Period::from_utc(start, end)),
            // JD of the same two dates.
            _ => Self::new(Period::new(
                Time::new(2_378_496.5),
                Time::new(2_524_593.5),
            )),
        }
    }
}

impl EphemerisProvider for Vsop87Sun {
    fn apparent_solar_longitude(&self, instant: Time<UT>) -> Result<Degrees, EphemerisError> {
        check_coverage(&self.coverage, instant)?;
        Ok(Self::longitude_tt(instant.to::<TT>()))
    }

    fn coverage(&self) -> Period<UT> {
        self.coverage
    }
}

/// Synthetic longitude `phase + rate · (t − epoch)`, wrapped into `[0, 360)`.
///
/// ```
/// use ganji::{EphemerisProvider, LinearSun, Time, UT};
/// use qtty::Degrees;
///
/// let sun = LinearSun::new(Time::<UT>::new(2_460_000.0), Degrees::new(350.0), 1.0);
/// let lon = sun.apparent_solar_longitude(Time::new(2_460_015.0)).unwrap();
/// assert!((lon.value() - 5.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct LinearSun {
    epoch: Time<UT>,
    phase: Degrees,
    rate_deg_per_day: f64,
    coverage: Period<UT>,
}

impl LinearSun {
    /// Coverage defaults to a century either side of `epoch`.
    pub fn new(epoch: Time<UT>, phase: Degrees, rate_deg_per_day: f64) -> Self {
        let century = Days::new(36_525.0);
        Self {
            epoch,
            phase,
            rate_deg_per_day,
            coverage: Period::new(epoch - century, epoch + century),
        }
    }

    pub fn with_coverage(mut self, coverage: Period<UT>) -> Self {
        self.coverage = coverage;
        self
    }

    /// Unwrapped longitude, continuous across 360°.
    pub fn unwrapped_at(&self, instant: Time<UT>) -> Degrees {
        Degrees::new(self.phase.value() + self.rate_deg_per_day * (instant - self.epoch).value())
    }

    /// Closed-form instant at which the unwrapped longitude equals `target`.
    pub fn instant_of(&self, target: Degrees) -> Time<UT> {
        self.epoch + Days::new((target - self.phase).value() / self.rate_deg_per_day)
    }
}

impl EphemerisProvider for LinearSun {
    fn apparent_solar_longitude(&self, instant: Time<UT>) -> Result<Degrees, EphemerisError> {
        check_coverage(&self.coverage, instant)?;
        Ok(Degrees::new(self.unwrapped_at(instant).value().rem_euclid(360.0)))
    }

    fn coverage(&self) -> Period<UT> {
        self.coverage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meeus_example_25b() {
        // 1992 Oct 13.0 TD: apparent λ = 199°54′21.8″
        let lon = Vsop87Sun::longitude_tt(Time::<TT>::new(2_448_908.5));
        let want = 199.0 + 54.0 / 60.0 + 21.8 / 3_600.0;
        assert!((lon.value() - want).abs() < 5e-5, "{}", lon.value());
    }

    #[test]
    fn near_zero_at_march_equinox_2024() {
        // 2024-03-20T03:06Z
        let instant = Time::<UT>::from_utc(Utc.with_ymd_and_hms(2024, 3, 20, 3, 6, 0).unwrap());
        let lon = Vsop87Sun::default()
            .apparent_solar_longitude(instant)
            .unwrap()
            .value();
        let signed = if lon > 180.0 { lon - 360.0 } else { lon };
        assert!(signed.abs() < 1e-3, "{lon}");
    }

    #[test]
    fn rejects_instants_outside_coverage() {
        let sun = Vsop87Sun::default();
        let early = Time::<UT>::from_utc(Utc.with_ymd_and_hms(1700, 6, 1, 0, 0, 0).unwrap());
        assert!(matches!(
            sun.apparent_solar_longitude(early),
            Err(EphemerisError::OutsideCoverage { .. })
        ));
    }

    #[test]
    fn linear_sun_wraps_and_inverts() {
        let epoch = Time::<UT>::new(2_460_000.0);
        let sun = LinearSun::new(epoch, Degrees::new(300.0), 2.0);
        let later = epoch + Days::new(40.0);
        let lon = sun.apparent_solar_longitude(later).unwrap();
        assert!((lon.value() - 20.0).abs() < 1e-9);
        let back = sun.instant_of(Degrees::new(380.0));
        assert!((back - later).abs() < Days::new(1e-9));
    }

    #[test]
    fn references_delegate() {
        let sun = LinearSun::new(Time::new(2_460_000.0), Degrees::new(0.0), 1.0);
        let by_ref: &dyn EphemerisProvider = &sun;
        assert_eq!(by_ref.coverage(), sun.coverage());
    }
}
