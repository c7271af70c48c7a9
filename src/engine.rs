// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Four Pillars derivation from a birth moment and stored term tables.
//!
//! The engine is pure: it reads already-validated [`YearTermTable`]s and never
//! calls an ephemeris, so one instance can serve any number of threads.
//!
//! ```
//! use ganji::{BirthMoment, FourPillarsEngine};
//!
//! let birth = BirthMoment::parse("2024-03-01", None).unwrap();
//! // Without a table for 2024 nothing is guessed.
//! assert!(FourPillarsEngine::default().derive(&birth, None, None).is_err());
//! ```

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::cycle::SexagenaryPillar;
use crate::error::DerivationError;
use crate::pillars::{self, DayBoundary, MonthBoundary, MonthSource};
use crate::store::JieqiTableStore;
use crate::term::{kst, YearTermTable};

/// A local (UTC+9) birth date, with or without a time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BirthMoment {
    local: NaiveDateTime,
    time_known: bool,
}

impl BirthMoment {
    /// A missing `time` is read as 00:00 for date-level logic.
    pub fn new(date: NaiveDate, time: Option<NaiveTime>) -> Self {
        Self {
            local: date.and_time(time.unwrap_or(NaiveTime::MIN)),
            time_known: time.is_some(),
        }
    }

    /// Parse `YYYY-MM-DD` and an optional `HH:MM` or `HH:MM:SS`.
    pub fn parse(date: &str, time: Option<&str>) -> Result<Self, DerivationError> {
        let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|e| {
            DerivationError::InvalidBirthInput(format!("date {date:?}: {e}"))
        })?;
        let time = match time.map(str::trim).filter(|t| !t.is_empty()) {
            None => None,
            Some(t) => Some(
                NaiveTime::parse_from_str(t, "%H:%M:%S")
                    .or_else(|_| NaiveTime::parse_from_str(t, "%H:%M"))
                    .map_err(|e| DerivationError::InvalidBirthInput(format!("time {t:?}: {e}")))?,
            ),
        };
        Ok(Self::new(date, time))
    }

    /// The local moment of a UTC instant; the time is known.
    pub fn from_utc(instant: DateTime<Utc>) -> Self {
        Self {
            local: instant.with_timezone(&kst()).naive_local(),
            time_known: true,
        }
    }

    pub fn local(&self) -> NaiveDateTime {
        self.local
    }

    pub fn date(&self) -> NaiveDate {
        self.local.date()
    }

    pub fn time_known(&self) -> bool {
        self.time_known
    }

    /// Local calendar year.
    pub fn year(&self) -> i32 {
        self.local.year()
    }
}

/// The derived pillars. `hour` is `None` when the birth time is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FourPillars {
    pub year: SexagenaryPillar,
    pub month: SexagenaryPillar,
    pub day: SexagenaryPillar,
    pub hour: Option<SexagenaryPillar>,
    /// Sexagenary year, which differs from the civil year before start-of-spring.
    pub sexagenary_year: i32,
    pub month_source: MonthSource,
}

/// Boundary conventions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub month_boundary: MonthBoundary,
    #[serde(default)]
    pub day_boundary: DayBoundary,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FourPillarsEngine {
    config: EngineConfig,
}

impl FourPillarsEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Derive all four pillars.
    ///
    /// `current` must be the table for the birth's local year; `prior`, when
    /// given, must be the year before. A missing or mismatched current table
    /// is [`DerivationError::MissingTermData`].
    pub fn derive(
        &self,
        birth: &BirthMoment,
        current: Option<&YearTermTable>,
        prior: Option<&YearTermTable>,
    ) -> Result<FourPillars, DerivationError> {
        let year = birth.year();
        let current = current.ok_or_else(|| DerivationError::MissingTermData {
            year,
            reason: "no table for the birth year".into(),
        })?;
        if current.year() != year {
            return Err(DerivationError::MissingTermData {
                year,
                reason: format!("table given is for {}", current.year()),
            });
        }
        if let Some(p) = prior.filter(|p| p.year() != year - 1) {
            return Err(DerivationError::MissingTermData {
                year: year - 1,
                reason: format!("prior table given is for {}", p.year()),
            });
        }

        let local = birth.local();
        let month_boundary = self.config.month_boundary;

        let sexagenary_year = pillars::sexagenary_year(local, current, month_boundary);
        let year_pos = pillars::year_pillar(sexagenary_year);

        let (branch, month_source) = pillars::resolve_month(local, current, prior, month_boundary);
        let month_pos = pillars::month_pillar(year_pos.stem(), branch);

        let day_date = if birth.time_known() {
            pillars::pillar_date(local, self.config.day_boundary)
        } else {
            birth.date()
        };
        let day_pos = pillars::day_pillar(day_date);

        let hour = birth
            .time_known()
            .then(|| pillars::hour_pillar(day_pos.stem(), local.hour()).pillar());

        Ok(FourPillars {
            year: year_pos.pillar(),
            month: month_pos.pillar(),
            day: day_pos.pillar(),
            hour,
            sexagenary_year,
            month_source,
        })
    }

    /// Derive using the birth year and the year before from `store`.
    pub fn derive_from_store(
        &self,
        store: &JieqiTableStore,
        birth: &BirthMoment,
    ) -> Result<FourPillars, DerivationError> {
        let year = birth.year();
        if store.get(year).is_none() {
            let reason = match store.rejected().get(&year) {
                Some(why) => format!("stored table failed validation: {why}"),
                None => format!("{} has no entry", store.path().display()),
            };
            return Err(DerivationError::MissingTermData { year, reason });
        }
        self.derive(birth, store.get(year), store.get(year - 1))
    }
}

/// [`FourPillarsEngine::derive`] with the default conventions.
pub fn derive_pillars(
    birth: &BirthMoment,
    table_for_year: Option<&YearTermTable>,
    table_for_prior_year: Option<&YearTermTable>,
) -> Result<FourPillars, DerivationError> {
    FourPillarsEngine::default().derive(birth, table_for_year, table_for_prior_year)
}

/// [`FourPillarsEngine::derive_from_store`] with the default conventions.
pub fn derive_from_store(
    store: &JieqiTableStore,
    birth: &BirthMoment,
) -> Result<FourPillars, DerivationError> {
    FourPillarsEngine::default().derive_from_store(store, birth)
}
