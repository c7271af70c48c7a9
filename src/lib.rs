// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Solar-term timing and Four Pillars derivation.
//!
//! The crate has two halves that meet at the persisted term table:
//!
//! - **Offline.** A [`SolarTermScanner`] samples an [`EphemerisProvider`]
//!   over a window, unwraps the longitude track once and refines every
//!   15° crossing by bisection. [`build_year_term_table`] turns that into a
//!   validated [`YearTermTable`] for one local (UTC+9) calendar year, and
//!   [`YearTermTableBuilder`] runs it over many years into a
//!   [`JieqiTableStore`].
//! - **Online.** [`FourPillarsEngine`] reads the birth year's table (and the
//!   year before) and derives the year, month, day and hour pillars. No
//!   ephemeris is consulted.
//!
//! # Time scales
//!
//! | Marker | Scale |
//! |--------|-------|
//! | [`UT`] | Universal Time (Earth rotation) |
//! | [`TT`] | Terrestrial Time |
//!
//! The difference **ΔT = TT − UT** is applied automatically when converting
//! between the two; see [`Time::<UT>::delta_t()`](Time::delta_t).
//!
//! # Example
//!
//! ```
//! use ganji::{build_year_term_table, derive_pillars, BirthMoment, BuildOptions, Vsop87Sun};
//!
//! let table = build_year_term_table(Vsop87Sun::default(), 2024, &BuildOptions::default()).unwrap();
//! let birth = BirthMoment::parse("2024-05-05", Some("13:20")).unwrap();
//! let pillars = derive_pillars(&birth, Some(&table), None).unwrap();
//! assert_eq!(pillars.year.label(), "甲辰");
//! assert_eq!(pillars.month.label(), "己巳");
//! ```

mod delta_t;
pub(crate) mod instant;
mod julian_date_ext;
mod nutation;
mod period;
pub(crate) mod scales;
mod vsop87;

pub mod builder;
pub mod config;
pub mod crossing;
pub mod cycle;
pub mod engine;
pub mod ephemeris;
pub mod error;
pub mod job;
pub mod pillars;
pub mod scanner;
pub mod store;
pub mod term;
pub mod unwrap;

// ── Re-exports ────────────────────────────────────────────────────────────

pub use instant::{Time, TimeScale};
pub use period::Period;
pub use scales::{TT, UT};

pub use builder::{build_year_term_table, BuildOptions, BuildReport, YearTermTableBuilder};
pub use config::BuilderConfig;
pub use crossing::CrossingFinder;
pub use cycle::{Branch, SexagenaryPillar, Stem, StemBranch};
pub use engine::{
    derive_from_store, derive_pillars, BirthMoment, EngineConfig, FourPillars, FourPillarsEngine,
};
pub use ephemeris::{EphemerisProvider, LinearSun, Vsop87Sun};
pub use error::{
    BuildError, ConfigError, DerivationError, EphemerisError, ScanError, StoreError, TableError,
};
pub use job::{JobState, JobStatus, JobTracker};
pub use pillars::{DayBoundary, MonthBoundary, MonthSource};
pub use scanner::{ScanConfig, SolarTermScanner, TermHit};
pub use store::JieqiTableStore;
pub use term::{kst, SolarTerm, SolarTermName, YearTermTable};
pub use unwrap::{Sample, UnwrappedTrack};

// ── Type aliases ──────────────────────────────────────────────────────────

/// Universal Time, the Earth-rotation civil time scale.
///
/// This is a type alias for [`Time<UT>`].
pub type UniversalTime = Time<UT>;

/// Julian Ephemeris Day, the dynamical day count ephemeris series expect.
///
/// This is a type alias for [`Time<TT>`].
pub type JulianEphemerisDay = Time<TT>;
