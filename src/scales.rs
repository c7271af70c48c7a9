// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Time-scale markers.
//!
//! | Marker | Axis | Used for |
//! |--------|------|----------|
//! | [`UT`] | Universal Time (Earth rotation) | sampling, bisection, civil timestamps |
//! | [`TT`] | Terrestrial Time | evaluating ephemeris series |

use super::instant::TimeScale;
use qtty::{Day, Days};

/// Terrestrial Time, as an absolute Julian Day.
///
/// The identity scale: the stored value *is* JD(TT).
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd)]
pub struct TT;

impl TimeScale for TT {
    const LABEL: &'static str = "TT";

    #[inline(always)]
    fn to_jd_tt(value: Days) -> Days {
        value
    }

    #[inline(always)]
    fn from_jd_tt(jd_tt: Days) -> Days {
        jd_tt
    }
}

/// Universal Time, as a Julian Day on the Earth-rotation axis.
///
/// `TT = UT + ΔT`, with ΔT taken from [`delta_t`](super::delta_t).
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd)]
pub struct UT;

impl TimeScale for UT {
    const LABEL: &'static str = "UT";

    #[inline]
    fn to_jd_tt(ut_value: Days) -> Days {
        ut_value + super::delta_t::delta_t_seconds_from_ut(ut_value).to::<Day>()
    }

    #[inline]
    fn from_jd_tt(jd_tt: Days) -> Days {
        // Fixed point of ut + ΔT(ut) = tt; ΔT changes by well under a
        // second per day, so three rounds are plenty.
        let mut ut = jd_tt;
        for _ in 0..3 {
            ut = jd_tt - super::delta_t::delta_t_seconds_from_ut(ut).to::<Day>();
        }
        ut
    }
}

impl From<super::instant::Time<UT>> for super::instant::Time<TT> {
    #[inline]
    fn from(t: super::instant::Time<UT>) -> Self {
        t.to::<TT>()
    }
}

impl From<super::instant::Time<TT>> for super::instant::Time<UT> {
    #[inline]
    fn from(t: super::instant::Time<TT>) -> Self {
        t.to::<UT>()
    }
}
