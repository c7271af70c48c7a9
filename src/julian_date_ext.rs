// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Epoch constants and century arguments on the TT axis.

use qtty::*;

use super::instant::Time;
use super::scales::TT;

impl Time<TT> {
    /// J2000.0 epoch: 2000-01-01T12:00:00 TT  (JD 2 451 545.0).
    pub const J2000: Self = Self::new(2_451_545.0);

    /// One Julian century expressed in days.
    pub const JULIAN_CENTURY: Days = Days::new(36_525.0);

    /// Julian centuries since J2000.0, the time argument of the solar series.
    #[inline]
    pub fn julian_centuries(&self) -> Centuries {
        Centuries::new((*self - Self::J2000).value() / Self::JULIAN_CENTURY.value())
    }
}
