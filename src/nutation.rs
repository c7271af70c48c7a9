// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Nutation in longitude, IAU 2000B (77 lunisolar terms).
//!
//! Only Δψ is needed: the solar longitude is measured along the ecliptic, so
//! the obliquity term never enters. Series from IERS Conventions 2010,
//! Table 5.3b; fundamental arguments from Table 5.2e.

use std::f64::consts::TAU;

const ARCSEC_TO_RAD: f64 = TAU / 1_296_000.0;

/// Fixed offset that brings 2000B close to the full 2000A model, arcsec.
const DPSI_OFFSET_ARCSEC: f64 = -0.000_135;

/// Delaunay arguments `[l, l', F, D, Ω]` in radians, `t` in Julian
/// centuries of TT since J2000.0.
fn delaunay_arguments(t: f64) -> [f64; 5] {
    let poly = |c: [f64; 5]| {
        (c[0] + t * (c[1] + t * (c[2] + t * (c[3] + t * c[4])))) * ARCSEC_TO_RAD
    };
    [
        poly([485_868.249_036, 1_717_915_923.217_8, 31.879_2, 0.051_635, -0.000_244_70]),
        poly([1_287_104.793_05, 129_596_581.048_1, -0.553_2, 0.000_136, -0.000_011_49]),
        poly([335_779.526_232, 1_739_527_262.847_8, -12.751_2, -0.001_037, 0.000_004_17]),
        poly([1_072_260.703_69, 1_602_961_601.209_0, -6.370_6, 0.006_593, -0.000_031_69]),
        poly([450_160.398_036, -6_962_890.543_1, 7.472_2, 0.007_702, -0.000_059_39]),
    ]
}

/// `[nl, nl', nF, nD, nΩ, S, S']`, amplitudes in units of 0.1 µas.
#[rustfmt::skip]
static LONGITUDE_TERMS: [[i64; 7]; 77] = [
    [  0,   0,   0,   0,   1,  -172064161, -174666],
    [  0,   0,   2,  -2,   2,   -13170906,  -1675],
    [  0,   0,   2,   0,   2,    -2276413,   -234],
    [  0,   0,   0,   0,   2,     2074554,    207],
    [  0,   1,   0,   0,   0,     1475877,  -3633],
    [  0,   1,   2,  -2,   2,     -516821,   1226],
    [  1,   0,   0,   0,   0,      711159,     73],
    [  0,   0,   2,   0,   1,     -387298,   -367],
    [  1,   0,   2,   0,   2,     -301461,    -36],
    [  0,  -1,   2,  -2,   2,      215829,   -494],
    [  0,   0,   2,  -2,   1,      128227,    137],
    [ -1,   0,   2,   0,   2,      123457,     11],
    [ -1,   0,   0,   2,   0,      156994,     10],
    [  1,   0,   0,   0,   1,       63110,     63],
    [ -1,   0,   0,   0,   1,      -57976,    -63],
    [ -1,   0,   2,   2,   2,      -59641,    -11],
    [  1,   0,   2,   0,   1,      -51613,    -42],
    [ -2,   0,   2,   0,   1,       45893,     50],
    [  0,   0,   0,   2,   0,       63384,     11],
    [  0,   0,   2,   2,   2,      -38571,     -1],
    [  0,  -2,   2,  -2,   2,       32481,      0],
    [ -2,   0,   0,   2,   0,      -47722,      0],
    [  2,   0,   2,   0,   2,      -31046,     -1],
    [  1,   0,   2,  -2,   2,       28593,      0],
    [ -1,   0,   2,   0,   1,       20441,     21],
    [  2,   0,   0,   0,   0,       29243,      0],
    [  0,   0,   2,   0,   0,       25887,      0],
    [  0,   1,   0,   0,   1,      -14053,    -25],
    [ -1,   0,   0,   2,   1,       15164,     10],
    [  0,   2,   2,  -2,   2,      -15794,     72],
    [  0,   0,  -2,   2,   0,       21783,      0],
    [  1,   0,   0,  -2,   1,      -12873,    -10],
    [  0,  -1,   0,   0,   1,      -12654,     11],
    [ -1,   0,   2,   2,   1,      -10204,      0],
    [  0,   2,   0,   0,   0,       16707,    -85],
    [  1,   0,   2,   2,   2,       -7691,      0],
    [ -2,   0,   2,   0,   0,      -11024,      0],
    [  0,   1,   2,   0,   2,        7566,    -21],
    [  0,   0,   2,   2,   1,       -6637,    -11],
    [  0,  -1,   2,   0,   2,       -7141,     21],
    [  0,   0,   0,   2,   1,       -6302,    -11],
    [  1,   0,   2,  -2,   1,        5800,     10],
    [  2,   0,   2,  -2,   2,        6443,      0],
    [ -2,   0,   0,   2,   1,       -5774,    -11],
    [  2,   0,   2,   0,   1,       -5350,      0],
    [  0,  -1,   2,  -2,   1,       -4752,    -11],
    [  0,   0,   0,  -2,   1,       -4940,    -11],
    [ -1,  -1,   0,   2,   0,        7350,      0],
    [  2,   0,   0,  -2,   1,       -4803,    -11],
    [  1,   0,   0,   2,   0,       -7677,      0],
    [  0,   1,   2,  -2,   1,        5417,      0],
    [  1,  -1,   0,   0,   0,        6624,      0],
    [ -2,   0,   2,   0,   2,       -5433,      0],
    [  3,   0,   2,   0,   2,       -4632,      0],
    [  0,  -1,   0,   2,   0,        6106,      0],
    [  1,  -1,   2,   0,   2,       -3593,      0],
    [  0,   0,   0,   1,   0,       -4766,      0],
    [ -1,  -1,   2,   2,   2,       -4095,      0],
    [ -1,   0,   2,   0,   0,        4229,      0],
    [  0,  -1,   2,   2,   2,       -3372,      0],
    [  2,   0,   0,   0,   1,       -3353,      0],
    [  1,   0,   2,   0,   0,       -3523,      0],
    [  1,   1,   0,   0,   0,       -3613,      0],
    [ -1,   0,   2,  -2,   1,        3522,      0],
    [  2,   0,   0,   0,  -1,        3312,      0],
    [  0,   0,  -2,   2,   1,       -3142,      0],
    [  0,   1,   0,   0,  -1,       -2927,      0],
    [  0,   1,   2,   0,   1,       -2887,      0],
    [  0,  -1,   2,   0,   1,        2451,      0],
    [  2,   0,  -2,   0,   0,       -2790,      0],
    [ -1,   0,   0,   2,  -1,        2145,      0],
    [  0,   0,   2,  -2,   0,        2816,      0],
    [  0,   1,   0,  -2,   0,        2700,      0],
    [  1,   0,   0,  -1,   0,       -2330,      0],
    [  0,   0,   0,   0,   2,        2283,      0],
    [  1,   0,  -2,   0,   0,       -2321,      0],
    [ -1,   0,   0,   1,   1,       -2049,      0],
];

/// Nutation in longitude Δψ, in arcseconds.
pub(crate) fn nutation_in_longitude(t: f64) -> f64 {
    let args = delaunay_arguments(t);
    let sum: f64 = LONGITUDE_TERMS
        .iter()
        .map(|row| {
            let arg: f64 = row[..5]
                .iter()
                .zip(args)
                .map(|(&n, a)| n as f64 * a)
                .sum();
            (row[5] as f64 + row[6] as f64 * t) * arg.sin()
        })
        .sum();
    sum * 1e-7 + DPSI_OFFSET_ARCSEC
}
