// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Resolvers for the individual pillars.
//!
//! All inputs are local civil times at UTC+9, compared against the local
//! instants stored in each [`YearTermTable`]. Nothing here touches an
//! ephemeris.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::cycle::{Branch, Stem, StemBranch};
use crate::term::{SolarTerm, YearTermTable};

/// Year whose sexagenary position is 甲子.
pub const CYCLE_EPOCH_YEAR: i32 = 1984;

/// Added to the Julian Day Number before taking it mod 60; 1949-10-01 is 甲子.
pub const DAY_CYCLE_OFFSET: i64 = 49;

/// When a month (and, with it, a year) turns over relative to its term.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MonthBoundary {
    /// At the term's exact instant.
    #[default]
    ExactInstant,
    /// At the first local midnight at or after the term's instant.
    NextLocalMidnight,
}

/// When a civil day turns over for the day pillar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DayBoundary {
    /// At 00:00 local.
    #[default]
    Midnight,
    /// At 23:00 local, the start of the 子 hour.
    RatHour,
}

impl FromStr for MonthBoundary {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" | "exact-instant" => Ok(Self::ExactInstant),
            "midnight" | "next-local-midnight" => Ok(Self::NextLocalMidnight),
            other => Err(format!("unknown month boundary {other:?}")),
        }
    }
}

impl FromStr for DayBoundary {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "midnight" => Ok(Self::Midnight),
            "rat-hour" | "rat" | "23" => Ok(Self::RatHour),
            other => Err(format!("unknown day boundary {other:?}")),
        }
    }
}

impl fmt::Display for MonthBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ExactInstant => "exact-instant",
            Self::NextLocalMidnight => "next-local-midnight",
        })
    }
}

impl fmt::Display for DayBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Midnight => "midnight",
            Self::RatHour => "rat-hour",
        })
    }
}

impl MonthBoundary {
    /// Local time at which `term` takes effect.
    pub fn effective(self, term: &SolarTerm) -> NaiveDateTime {
        let local = term.instant_local.naive_local();
        match self {
            Self::ExactInstant => local,
            Self::NextLocalMidnight if local.time() == NaiveTime::MIN => local,
            Self::NextLocalMidnight => (local.date() + Duration::days(1)).and_time(NaiveTime::MIN),
        }
    }
}

/// Julian Day Number of a Gregorian date (Fliegel and Van Flandern, 1968).
///
/// ```
/// assert_eq!(ganji::pillars::julian_day_number(2000, 1, 1), 2_451_545);
/// ```
pub fn julian_day_number(year: i32, month: u32, day: u32) -> i64 {
    let (y, m, d) = (i64::from(year), i64::from(month), i64::from(day));
    let a = (m - 14) / 12;
    (1461 * (y + 4800 + a)) / 4 + (367 * (m - 2 - 12 * a)) / 12
        - (3 * ((y + 4900 + a) / 100)) / 4
        + d
        - 32075
}

/// Year the birth belongs to in the sexagenary count: the local calendar
/// year once start-of-spring has taken effect, the year before otherwise.
pub fn sexagenary_year(
    birth: NaiveDateTime,
    current: &YearTermTable,
    boundary: MonthBoundary,
) -> i32 {
    if birth >= boundary.effective(current.start_of_spring()) {
        current.year()
    } else {
        current.year() - 1
    }
}

pub fn year_pillar(sexagenary_year: i32) -> StemBranch {
    StemBranch::new(i64::from(sexagenary_year) - i64::from(CYCLE_EPOCH_YEAR))
}

/// Where the month branch came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MonthSource {
    /// A major term of the birth's own year.
    CurrentYear,
    /// A major term of the previous year's table.
    PriorYear,
    /// No major term precedes the birth in the tables given.
    BeforeFirstTerm,
}

/// Branch of the month in force at `birth`, and which table supplied it.
///
/// The latest major term at or before `birth` across the prior and current
/// tables decides. A birth before every known major term falls in the 子
/// month, the one preceding minor-cold's 丑.
pub fn resolve_month(
    birth: NaiveDateTime,
    current: &YearTermTable,
    prior: Option<&YearTermTable>,
    boundary: MonthBoundary,
) -> (Branch, MonthSource) {
    let tagged = prior
        .into_iter()
        .map(|t| (t, MonthSource::PriorYear))
        .chain(std::iter::once((current, MonthSource::CurrentYear)));
    tagged
        .flat_map(|(table, source)| table.major_terms().map(move |term| (term, source)))
        .filter(|(term, _)| boundary.effective(term) <= birth)
        .max_by_key(|(term, _)| term.instant_utc)
        .and_then(|(term, source)| Some((Branch::of_month(term.name.month_offset()?), source)))
        .unwrap_or((Branch::Ja, MonthSource::BeforeFirstTerm))
}

pub fn month_branch(
    birth: NaiveDateTime,
    current: &YearTermTable,
    prior: Option<&YearTermTable>,
    boundary: MonthBoundary,
) -> Branch {
    resolve_month(birth, current, prior, boundary).0
}

/// Month pillar from the sexagenary year's stem and the month branch.
///
/// Each pair of year stems five apart shares a run of twelve months, starting
/// at 丙寅 (index 2) for 甲 and 己.
pub fn month_pillar(year_stem: Stem, branch: Branch) -> StemBranch {
    let run = i64::from(year_stem.index() % 5) * 12;
    StemBranch::new(run + 2 + i64::from(branch.month_offset()))
}

pub fn day_pillar(date: NaiveDate) -> StemBranch {
    StemBranch::new(julian_day_number(date.year(), date.month(), date.day()) + DAY_CYCLE_OFFSET)
}

/// Civil date that supplies the day pillar under `boundary`.
pub fn pillar_date(local: NaiveDateTime, boundary: DayBoundary) -> NaiveDate {
    match boundary {
        DayBoundary::RatHour if local.hour() >= 23 => local.date() + Duration::days(1),
        _ => local.date(),
    }
}

/// Two-hour block of a local hour: 23:00–00:59 is 子, 01:00–02:59 is 丑, …
pub fn hour_branch(hour: u32) -> Branch {
    Branch::from_index((hour + 1) / 2)
}

/// Hour pillar; the day's 子 hour opens a run of twelve starting at 甲子 for
/// 甲 and 己 days.
pub fn hour_pillar(day_stem: Stem, hour: u32) -> StemBranch {
    let run = i64::from(day_stem.index() % 5) * 12;
    StemBranch::new(run + i64::from(hour_branch(hour).index()))
}
