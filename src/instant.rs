// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Scale-tagged instants.
//!
//! [`Time<S>`] stores a day count whose meaning is fixed by the marker
//! `S: TimeScale`. The root finder samples and bisects on the civil [`UT`]
//! axis, while ephemeris formulas are evaluated on the uniform [`TT`] axis;
//! [`Time::to`] moves an instant between the two and applies ΔT on the way.
//!
//! [`UT`]: crate::UT
//! [`TT`]: crate::TT

use chrono::{DateTime, Utc};
use qtty::*;
use std::marker::PhantomData;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// Unix epoch (1970-01-01T00:00:00 UT) as a Julian Day.
const UNIX_EPOCH_JD: f64 = 2_440_587.5;

/// Marker trait for time scales.
///
/// Every scale converts its native day count to and from an absolute Julian
/// Day on the TT axis, which is the canonical internal representation.
pub trait TimeScale: Copy + Clone + std::fmt::Debug + PartialEq + PartialOrd + 'static {
    /// Display label used by [`Time`] formatting.
    const LABEL: &'static str;

    /// Native quantity → absolute JD(TT).
    fn to_jd_tt(value: Days) -> Days;

    /// Absolute JD(TT) → native quantity.
    fn from_jd_tt(jd_tt: Days) -> Days;
}

/// A point on time scale `S`.
///
/// Layout-identical to a single `f64` day count.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd)]
pub struct Time<S: TimeScale> {
    quantity: Days,
    _scale: PhantomData<S>,
}

impl<S: TimeScale> Time<S> {
    /// Create from a raw day count on this scale.
    #[inline]
    pub const fn new(value: f64) -> Self {
        Self {
            quantity: Days::new(value),
            _scale: PhantomData,
        }
    }

    /// Create from a [`Days`] quantity on this scale.
    #[inline]
    pub const fn from_days(days: Days) -> Self {
        Self {
            quantity: days,
            _scale: PhantomData,
        }
    }

    /// The underlying day count.
    #[inline]
    pub const fn quantity(&self) -> Days {
        self.quantity
    }

    /// The underlying day count as a scalar.
    #[inline]
    pub const fn value(&self) -> f64 {
        self.quantity.value()
    }

    /// Absolute JD(TT) of this instant.
    #[inline]
    pub fn julian_day(&self) -> Days {
        S::to_jd_tt(self.quantity)
    }

    /// Build an instant from an absolute JD(TT).
    #[inline]
    pub fn from_julian_day(jd: Days) -> Self {
        Self::from_days(S::from_jd_tt(jd))
    }

    /// Re-express this instant on another scale.
    #[inline]
    pub fn to<T: TimeScale>(&self) -> Time<T> {
        Time::<T>::from_julian_day(S::to_jd_tt(self.quantity))
    }

    /// Convert to a UTC timestamp.
    ///
    /// Rounded to the millisecond, which is below the day count's own
    /// resolution near the present epoch. Returns `None` when the instant is
    /// outside chrono's representable range.
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        use super::scales::UT;
        let jd_ut = self.to::<UT>().quantity();
        let seconds_since_epoch = (jd_ut - Days::new(UNIX_EPOCH_JD)).to::<Second>().value();
        let millis = (seconds_since_epoch * 1e3).round();
        if !millis.is_finite() || millis.abs() > i64::MAX as f64 {
            return None;
        }
        DateTime::<Utc>::from_timestamp_millis(millis as i64)
    }

    /// Build an instant from a UTC timestamp, read as Universal Time.
    pub fn from_utc(datetime: DateTime<Utc>) -> Self {
        use super::scales::UT;
        let seconds_since_epoch = Seconds::new(datetime.timestamp() as f64);
        let nanos = Seconds::new(datetime.timestamp_subsec_nanos() as f64 / 1e9);
        let jd_ut = Days::new(UNIX_EPOCH_JD) + (seconds_since_epoch + nanos).to::<Day>();
        Time::<UT>::from_days(jd_ut).to::<S>()
    }

    #[inline]
    pub const fn min(self, other: Self) -> Self {
        Self::from_days(self.quantity.min_const(other.quantity))
    }

    #[inline]
    pub const fn max(self, other: Self) -> Self {
        Self::from_days(self.quantity.max_const(other.quantity))
    }

    /// Midpoint between two instants; the bisection step of the root finder.
    #[inline]
    pub const fn mean(self, other: Self) -> Self {
        Self::from_days(self.quantity.const_add(other.quantity).const_div(2.0))
    }
}

impl<S: TimeScale> std::fmt::Display for Time<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", S::LABEL, self.quantity)
    }
}

impl<S: TimeScale> Add<Days> for Time<S> {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Days) -> Self::Output {
        Self::from_days(self.quantity + rhs)
    }
}

impl<S: TimeScale> AddAssign<Days> for Time<S> {
    #[inline]
    fn add_assign(&mut self, rhs: Days) {
        self.quantity += rhs;
    }
}

impl<S: TimeScale> Sub<Days> for Time<S> {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Days) -> Self::Output {
        Self::from_days(self.quantity - rhs)
    }
}

impl<S: TimeScale> SubAssign<Days> for Time<S> {
    #[inline]
    fn sub_assign(&mut self, rhs: Days) {
        self.quantity -= rhs;
    }
}

impl<S: TimeScale> Sub for Time<S> {
    type Output = Days;
    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        self.quantity - rhs.quantity
    }
}

impl<S: TimeScale> From<Days> for Time<S> {
    #[inline]
    fn from(days: Days) -> Self {
        Self::from_days(days)
    }
}

#[cfg(test)]
mod tests {
    use super::super::scales::{TT, UT};
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn ut_utc_roundtrip_is_sub_millisecond() {
        let datetime = Utc.with_ymd_and_hms(2024, 2, 4, 8, 27, 0).unwrap();
        let ut = Time::<UT>::from_utc(datetime);
        let back = ut.to_utc().expect("to_utc");
        assert_eq!(back, datetime);
    }

    #[test]
    fn unix_epoch_maps_to_its_julian_day() {
        let epoch = Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap();
        let ut = Time::<UT>::from_utc(epoch);
        assert!((ut.value() - UNIX_EPOCH_JD).abs() < 1e-9);
    }

    #[test]
    fn tt_runs_ahead_of_ut() {
        let ut = Time::<UT>::new(2_451_545.0);
        let tt = ut.to::<TT>();
        let offset = (tt.quantity() - ut.quantity()).to::<Second>();
        assert!((offset - Seconds::new(63.83)).abs() < Seconds::new(1.0));
    }

    #[test]
    fn mean_is_the_midpoint() {
        let a = Time::<UT>::new(10.0);
        let b = Time::<UT>::new(14.0);
        assert_eq!(a.mean(b).quantity(), Days::new(12.0));
        assert_eq!(b.mean(a).quantity(), Days::new(12.0));
        assert_eq!(a.min(b), a);
        assert_eq!(a.max(b), b);
    }

    #[test]
    fn day_arithmetic() {
        let mut t = Time::<UT>::new(2_460_000.0);
        t += Days::new(1.5);
        assert_eq!(t.quantity(), Days::new(2_460_001.5));
        t -= Days::new(0.5);
        assert_eq!(t - Time::<UT>::new(2_460_000.0), Days::new(1.0));
        assert!(t > Time::<UT>::new(2_460_000.0));
    }

    #[test]
    fn display_carries_scale_label() {
        let t = Time::<UT>::new(2_451_545.0);
        assert!(format!("{t}").starts_with("UT"));
    }
}
