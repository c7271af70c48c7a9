// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! # ΔT = TT − UT
//!
//! Solar-term instants are published in civil time, but the solar longitude
//! series is a function of the uniform TT axis. The [`UT`](super::UT) scale
//! applies this correction automatically in both directions, so callers never
//! touch this module directly.
//!
//! ## Model
//! * before 948 CE, 948–1600 CE: Stephenson & Houlden (1986) quadratics
//! * 1620–1992: Meeus biennial table, bicubic interpolation
//! * 1992–2005, 2005–2050, 2050–2150: Espenak & Meeus (2006) polynomials
//! * after 2150: Morrison & Stephenson (2004) long-term parabola
//!
//! Uncertainty is below a second for the twentieth century and grows to
//! minutes a century beyond today, which is still far inside the precision of
//! a minute-resolution term table.

use qtty::{Days, Seconds};

/// Total number of tabulated terms (biennial 1620–1992).
const TERMS: usize = 187;

/// Biennial ΔT table from 1620 to 1992 (in seconds), compiled by J. Meeus.
#[rustfmt::skip]
const DELTA_T: [f64; TERMS] = [
    124.0,115.0,106.0, 98.0, 91.0, 85.0, 79.0, 74.0, 70.0, 65.0,
     62.0, 58.0, 55.0, 53.0, 50.0, 48.0, 46.0, 44.0, 42.0, 40.0,
     37.0, 35.0, 33.0, 31.0, 28.0, 26.0, 24.0, 22.0, 20.0, 18.0,
     16.0, 14.0, 13.0, 12.0, 11.0, 10.0,  9.0,  9.0,  9.0,  9.0,
      9.0,  9.0,  9.0,  9.0, 10.0, 10.0, 10.0, 10.0, 10.0, 11.0,
     11.0, 11.0, 11.0, 11.0, 11.0, 11.0, 12.0, 12.0, 12.0, 12.0,
     12.0, 12.0, 13.0, 13.0, 13.0, 13.0, 14.0, 14.0, 14.0, 15.0,
     15.0, 15.0, 15.0, 16.0, 16.0, 16.0, 16.0, 16.0, 17.0, 17.0,
     17.0, 17.0, 17.0, 17.0, 17.0, 17.0, 16.0, 16.0, 15.0, 14.0,
     13.7, 13.1, 12.7, 12.5, 12.5, 12.5, 12.5, 12.5, 12.5, 12.3,
     12.0, 11.4, 10.6,  9.6,  8.6,  7.5,  6.6,  6.0,  5.7,  5.6,
      5.7,  5.9,  6.2,  6.5,  6.8,  7.1,  7.3,  7.5,  7.7,  7.8,
      7.9,  7.5,  6.4,  5.4,  2.9,  1.6, -1.0, -2.7, -3.6, -4.7,
     -5.4, -5.2, -5.5, -5.6, -5.8, -5.9, -6.2, -6.4, -6.1, -4.7,
     -2.7,  0.0,  2.6,  5.4,  7.7, 10.5, 13.4, 16.0, 18.2, 20.2,
     21.2, 22.4, 23.5, 23.9, 24.3, 24.0, 23.9, 23.9, 23.7, 24.0,
     24.3, 25.3, 26.2, 27.3, 28.2, 29.1, 30.0, 30.7, 31.4, 32.2,
     33.1, 34.0, 35.0, 36.5, 38.3, 40.2, 42.2, 44.5, 46.5, 48.5,
     50.5, 52.2, 53.8, 54.9, 55.8, 56.9, 58.3,
];

const JULIAN_CENTURY_D: f64 = 36_525.0;
const JULIAN_YEAR_D: f64 = 365.25;

/// JD(UT) of 2000-01-01T00:00.
const JD_YEAR_2000_UT: f64 = 2_451_544.5;

/// Decimal Gregorian year for a JD(UT); adequate for polynomial arguments.
#[inline]
fn decimal_year(jd_ut: f64) -> f64 {
    2000.0 + (jd_ut - JD_YEAR_2000_UT) / JULIAN_YEAR_D
}

/// Years before 948 CE.
#[inline]
fn delta_t_ancient(jd_ut: f64) -> f64 {
    const JD_EPOCH_948_UT: f64 = 2_067_314.5;
    let c = (jd_ut - JD_EPOCH_948_UT) / JULIAN_CENTURY_D;
    1_830.0 - 405.0 * c + 46.5 * c * c
}

/// 948–1600 CE.
#[inline]
fn delta_t_medieval(jd_ut: f64) -> f64 {
    const JD_EPOCH_1850_UT: f64 = 2_396_758.5;
    let c = (jd_ut - JD_EPOCH_1850_UT) / JULIAN_CENTURY_D;
    22.5 * c * c
}

/// 1600–1992, bicubic interpolation in the biennial table.
#[inline]
fn delta_t_table(jd_ut: f64) -> f64 {
    const JD_TABLE_START_1620: f64 = 2_312_752.5;
    const BIENNIAL_STEP_D: f64 = 730.5;

    let mut i = ((jd_ut - JD_TABLE_START_1620) / BIENNIAL_STEP_D) as usize;
    if i > TERMS - 3 {
        i = TERMS - 3;
    }
    let a = DELTA_T[i + 1] - DELTA_T[i];
    let b = DELTA_T[i + 2] - DELTA_T[i + 1];
    let c = a - b;
    let n = (jd_ut - (JD_TABLE_START_1620 + BIENNIAL_STEP_D * i as f64)) / BIENNIAL_STEP_D;
    DELTA_T[i + 1] + n / 2.0 * (a + b + n * c)
}

/// 1992–2005.
#[inline]
fn delta_t_turn_of_century(year: f64) -> f64 {
    let t = year - 2000.0;
    63.86 + 0.3345 * t - 0.060374 * t.powi(2)
        + 0.0017275 * t.powi(3)
        + 0.000651814 * t.powi(4)
        + 0.00002373599 * t.powi(5)
}

/// 2005–2050.
#[inline]
fn delta_t_near_future(year: f64) -> f64 {
    let t = year - 2000.0;
    62.92 + 0.32217 * t + 0.005589 * t * t
}

/// 2050–2150, blending the near-future fit into the long-term parabola.
#[inline]
fn delta_t_far_future(year: f64) -> f64 {
    let u = (year - 1820.0) / 100.0;
    -20.0 + 32.0 * u * u - 0.5628 * (2150.0 - year)
}

/// After 2150.
#[inline]
fn delta_t_long_term(year: f64) -> f64 {
    let u = (year - 1820.0) / 100.0;
    -20.0 + 32.0 * u * u
}

/// Returns **ΔT** for a Julian Day on the **UT** axis.
pub(crate) fn delta_t_seconds_from_ut(jd_ut: Days) -> Seconds {
    let jd = jd_ut.value();
    let seconds = match jd {
        jd if jd < 2_067_314.5 => delta_t_ancient(jd),
        jd if jd < 2_305_447.5 => delta_t_medieval(jd),
        jd if jd < 2_448_622.5 => delta_t_table(jd),
        jd => match decimal_year(jd) {
            y if y < 2005.0 => delta_t_turn_of_century(y),
            y if y < 2050.0 => delta_t_near_future(y),
            y if y < 2150.0 => delta_t_far_future(y),
            y => delta_t_long_term(y),
        },
    };
    Seconds::new(seconds)
}

impl crate::Time<crate::UT> {
    /// ΔT = TT − UT at this epoch.
    #[inline]
    pub fn delta_t(&self) -> Seconds {
        delta_t_seconds_from_ut(self.quantity())
    }
}
