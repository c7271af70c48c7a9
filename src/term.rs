// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! The 24 solar terms and validated per-year term tables.

use chrono::{DateTime, Datelike, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{TableError, UnknownTermName};

/// Offset of Korea Standard Time, seconds east of UTC.
pub const KST_OFFSET_SECONDS: i32 = 9 * 3600;

/// The fixed UTC+09:00 offset, checked at compile time.
pub const KST: FixedOffset = match FixedOffset::east_opt(KST_OFFSET_SECONDS) {
    Some(offset) => offset,
    None => panic!("UTC+9 is a valid offset"),
};

/// The fixed UTC+09:00 offset used for every local instant.
pub fn kst() -> FixedOffset {
    KST
}

/// Number of terms in a complete year.
pub const TERMS_PER_YEAR: usize = 24;

/// One of the 24 solar terms, named by its English identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SolarTermName {
    SpringEquinox,
    ClearAndBright,
    GrainRain,
    StartOfSummer,
    GrainBuds,
    GrainInEar,
    SummerSolstice,
    MinorHeat,
    MajorHeat,
    StartOfAutumn,
    EndOfHeat,
    WhiteDew,
    AutumnEquinox,
    ColdDew,
    FrostDescent,
    StartOfWinter,
    MinorSnow,
    MajorSnow,
    WinterSolstice,
    MinorCold,
    MajorCold,
    StartOfSpring,
    RainWater,
    AwakeningOfInsects,
}

use SolarTermName::*;

impl SolarTermName {
    /// All terms in degree order, from 0°.
    pub const ALL: [SolarTermName; TERMS_PER_YEAR] = [
        SpringEquinox,
        ClearAndBright,
        GrainRain,
        StartOfSummer,
        GrainBuds,
        GrainInEar,
        SummerSolstice,
        MinorHeat,
        MajorHeat,
        StartOfAutumn,
        EndOfHeat,
        WhiteDew,
        AutumnEquinox,
        ColdDew,
        FrostDescent,
        StartOfWinter,
        MinorSnow,
        MajorSnow,
        WinterSolstice,
        MinorCold,
        MajorCold,
        StartOfSpring,
        RainWater,
        AwakeningOfInsects,
    ];

    /// Apparent solar longitude at which the term begins.
    pub const fn degree(self) -> u16 {
        self as u16 * 15
    }

    pub fn from_degree(degree: u16) -> Option<Self> {
        if degree % 15 != 0 {
            return None;
        }
        Self::ALL.get(usize::from(degree / 15)).copied()
    }

    /// Terms at 15° mod 30 open a civil month.
    pub const fn is_major(self) -> bool {
        self.degree() % 30 == 15
    }

    /// Months after the 寅 month that this major term opens (0 for
    /// start-of-spring, 11 for minor-cold).
    pub const fn month_offset(self) -> Option<u8> {
        if self.is_major() {
            Some((((self.degree() + 360 - 315) % 360) / 30) as u8)
        } else {
            None
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            SpringEquinox => "spring-equinox",
            ClearAndBright => "clear-and-bright",
            GrainRain => "grain-rain",
            StartOfSummer => "start-of-summer",
            GrainBuds => "grain-buds",
            GrainInEar => "grain-in-ear",
            SummerSolstice => "summer-solstice",
            MinorHeat => "minor-heat",
            MajorHeat => "major-heat",
            StartOfAutumn => "start-of-autumn",
            EndOfHeat => "end-of-heat",
            WhiteDew => "white-dew",
            AutumnEquinox => "autumn-equinox",
            ColdDew => "cold-dew",
            FrostDescent => "frost-descent",
            StartOfWinter => "start-of-winter",
            MinorSnow => "minor-snow",
            MajorSnow => "major-snow",
            WinterSolstice => "winter-solstice",
            MinorCold => "minor-cold",
            MajorCold => "major-cold",
            StartOfSpring => "start-of-spring",
            RainWater => "rain-water",
            AwakeningOfInsects => "awakening-of-insects",
        }
    }

    pub const fn korean(self) -> &'static str {
        match self {
            SpringEquinox => "춘분",
            ClearAndBright => "청명",
            GrainRain => "곡우",
            StartOfSummer => "입하",
            GrainBuds => "소만",
            GrainInEar => "망종",
            SummerSolstice => "하지",
            MinorHeat => "소서",
            MajorHeat => "대서",
            StartOfAutumn => "입추",
            EndOfHeat => "처서",
            WhiteDew => "백로",
            AutumnEquinox => "추분",
            ColdDew => "한로",
            FrostDescent => "상강",
            StartOfWinter => "입동",
            MinorSnow => "소설",
            MajorSnow => "대설",
            WinterSolstice => "동지",
            MinorCold => "소한",
            MajorCold => "대한",
            StartOfSpring => "입춘",
            RainWater => "우수",
            AwakeningOfInsects => "경칩",
        }
    }

    pub const fn hanja(self) -> &'static str {
        match self {
            SpringEquinox => "春分",
            ClearAndBright => "清明",
            GrainRain => "穀雨",
            StartOfSummer => "立夏",
            GrainBuds => "小滿",
            GrainInEar => "芒種",
            SummerSolstice => "夏至",
            MinorHeat => "小暑",
            MajorHeat => "大暑",
            StartOfAutumn => "立秋",
            EndOfHeat => "處暑",
            WhiteDew => "白露",
            AutumnEquinox => "秋分",
            ColdDew => "寒露",
            FrostDescent => "霜降",
            StartOfWinter => "立冬",
            MinorSnow => "小雪",
            MajorSnow => "大雪",
            WinterSolstice => "冬至",
            MinorCold => "小寒",
            MajorCold => "大寒",
            StartOfSpring => "立春",
            RainWater => "雨水",
            AwakeningOfInsects => "驚蟄",
        }
    }

    /// The term that follows this one, 15° later.
    pub fn next(self) -> Self {
        Self::ALL[(self as usize + 1) % TERMS_PER_YEAR]
    }
}

impl fmt::Display for SolarTermName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SolarTermName {
    type Err = UnknownTermName;

    /// Accepts the English identifier, the Korean label or the hanja label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|n| n.as_str() == s || n.korean() == s || n.hanja() == s)
            .ok_or_else(|| UnknownTermName(s.to_string()))
    }
}

/// A located solar term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolarTerm {
    pub name: SolarTermName,
    pub degree: u16,
    #[serde(rename = "instantUTC")]
    pub instant_utc: DateTime<Utc>,
    #[serde(rename = "instantLocal")]
    pub instant_local: DateTime<FixedOffset>,
}

impl SolarTerm {
    pub fn new(name: SolarTermName, instant_utc: DateTime<Utc>) -> Self {
        Self {
            name,
            degree: name.degree(),
            instant_utc,
            instant_local: instant_utc.with_timezone(&kst()),
        }
    }

    /// Local calendar year of the term.
    pub fn local_year(&self) -> i32 {
        self.instant_local.year()
    }
}

/// Exactly 24 validated terms of one local calendar year, in time order.
///
/// The only way to obtain one is [`YearTermTable::new`], which checks:
///
/// - 24 entries, no name repeated, each degree matching its name;
/// - every local instant falls in `year`, at UTC+9, on the same instant as
///   its UTC counterpart;
/// - instants strictly increase and degrees advance by 15° cyclically;
/// - neighbours are 10 to 20 days apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearTermTable {
    year: i32,
    terms: Vec<SolarTerm>,
    #[serde(skip)]
    spring: usize,
}

impl YearTermTable {
    pub const MIN_SPACING_DAYS: f64 = 10.0;
    pub const MAX_SPACING_DAYS: f64 = 20.0;

    pub fn new(year: i32, mut terms: Vec<SolarTerm>) -> Result<Self, TableError> {
        if terms.len() != TERMS_PER_YEAR {
            return Err(TableError::WrongCount(terms.len()));
        }

        let mut seen = [false; TERMS_PER_YEAR];
        for term in &terms {
            let slot = &mut seen[term.name as usize];
            if *slot {
                return Err(TableError::DuplicateTerm(term.name.to_string()));
            }
            *slot = true;

            if term.degree != term.name.degree() {
                return Err(TableError::DegreeMismatch {
                    name: term.name.to_string(),
                    degree: term.degree,
                    expected: term.name.degree(),
                });
            }
            if term.instant_local != term.instant_utc
                || term.instant_local.offset().local_minus_utc() != KST_OFFSET_SECONDS
            {
                return Err(TableError::InstantMismatch {
                    name: term.name.to_string(),
                    utc: term.instant_utc.to_rfc3339(),
                    local: term.instant_local.to_rfc3339(),
                });
            }
            if term.local_year() != year {
                return Err(TableError::OutsideYear {
                    name: term.name.to_string(),
                    year,
                    found: term.local_year(),
                });
            }
        }

        terms.sort_by_key(|t| t.instant_utc);
        for pair in terms.windows(2) {
            let (previous, next) = (&pair[0], &pair[1]);
            if next.instant_utc <= previous.instant_utc {
                return Err(TableError::NotIncreasing(next.name.to_string()));
            }
            if next.name != previous.name.next() {
                return Err(TableError::OutOfOrder {
                    previous: previous.name.to_string(),
                    next: next.name.to_string(),
                });
            }
            let days = (next.instant_utc - previous.instant_utc).num_milliseconds() as f64
                / 86_400_000.0;
            if !(Self::MIN_SPACING_DAYS..=Self::MAX_SPACING_DAYS).contains(&days) {
                return Err(TableError::SpacingAnomaly {
                    previous: previous.name.to_string(),
                    next: next.name.to_string(),
                    days,
                });
            }
        }

        let spring = terms
            .iter()
            .position(|t| t.name == StartOfSpring)
            .ok_or_else(|| TableError::WrongCount(terms.len()))?;
        Ok(Self { year, terms, spring })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Terms in time order.
    pub fn terms(&self) -> &[SolarTerm] {
        &self.terms
    }

    pub fn into_terms(self) -> Vec<SolarTerm> {
        self.terms
    }

    pub fn get(&self, name: SolarTermName) -> Option<&SolarTerm> {
        self.terms.iter().find(|t| t.name == name)
    }

    /// The year's start-of-spring term; present in every valid table.
    pub fn start_of_spring(&self) -> &SolarTerm {
        &self.terms[self.spring]
    }

    /// The 12 month-opening terms, in time order.
    pub fn major_terms(&self) -> impl Iterator<Item = &SolarTerm> + '_ {
        self.terms.iter().filter(|t| t.name.is_major())
    }
}
