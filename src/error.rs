// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Error types.
//!
//! Build failures ([`BuildError`]) abort one year and never the whole batch.
//! Derivation failures ([`DerivationError`]) go straight back to the caller;
//! nothing in the engine substitutes a default for missing term data.

use thiserror::Error;

/// The ephemeris provider could not evaluate an instant.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EphemerisError {
    #[error("instant {instant} is outside the provider coverage {coverage}")]
    OutsideCoverage { instant: String, coverage: String },
}

/// Failures of a single scanner run, before any year context is attached.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScanError {
    #[error("scan window {requested} does not overlap provider coverage {coverage}")]
    RangeExceeded { requested: String, coverage: String },

    #[error("could not bracket {degree}°: {reason}")]
    BracketNotFound { degree: u16, reason: String },

    #[error("sampling step {step_hours} h is outside [{min_hours:.4}, {max_hours}] h")]
    InvalidStep {
        step_hours: f64,
        min_hours: f64,
        max_hours: f64,
    },

    #[error(transparent)]
    Ephemeris(#[from] EphemerisError),
}

/// A term name matched none of the English, Korean or hanja labels.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown solar term {0:?}")]
pub struct UnknownTermName(pub String);

/// A year's term sequence broke one of the table invariants.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    #[error("expected 24 terms, found {0}")]
    WrongCount(usize),

    #[error("term {0} appears more than once")]
    DuplicateTerm(String),

    #[error("term {name} carries degree {degree}, expected {expected}")]
    DegreeMismatch { name: String, degree: u16, expected: u16 },

    #[error("term {name} falls in local year {found}, table is for {year}")]
    OutsideYear { name: String, year: i32, found: i32 },

    #[error("term {name}: local instant {local} does not match UTC instant {utc}")]
    InstantMismatch {
        name: String,
        utc: String,
        local: String,
    },

    #[error("terms are not in increasing time order at {0}")]
    NotIncreasing(String),

    #[error("term {next} does not follow {previous} in degree order")]
    OutOfOrder { previous: String, next: String },

    #[error("{previous} → {next} spans {days:.2} days, outside 10–20")]
    SpacingAnomaly {
        previous: String,
        next: String,
        days: f64,
    },
}

/// Per-year failure of the offline builder.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("year {year}: search window outside ephemeris coverage: {detail}")]
    RangeExceeded { year: i32, detail: String },

    #[error("year {year}: bracket not found for {degree}°: {detail}")]
    BracketNotFound {
        year: i32,
        degree: u16,
        detail: String,
    },

    #[error("year {year}: {found} terms survived filtering: {detail}")]
    IncompleteYear {
        year: i32,
        found: usize,
        detail: String,
    },

    #[error("year {year}: located terms do not form a valid table: {source}")]
    InvalidTable {
        year: i32,
        #[source]
        source: TableError,
    },

    #[error("year {year}: ephemeris failure: {source}")]
    Ephemeris {
        year: i32,
        #[source]
        source: EphemerisError,
    },

    #[error("invalid build options: {0}")]
    InvalidOptions(String),
}

impl BuildError {
    /// Attach year context to a scanner failure.
    pub fn from_scan(year: i32, err: ScanError) -> Self {
        match err {
            ScanError::RangeExceeded {
                requested,
                coverage,
            } => BuildError::RangeExceeded {
                year,
                detail: format!("requested {requested}, coverage {coverage}"),
            },
            ScanError::BracketNotFound { degree, reason } => BuildError::BracketNotFound {
                year,
                degree,
                detail: reason,
            },
            invalid @ ScanError::InvalidStep { .. } => {
                BuildError::InvalidOptions(invalid.to_string())
            }
            ScanError::Ephemeris(source) => BuildError::Ephemeris { year, source },
        }
    }

    /// The year this failure belongs to, if any.
    pub fn year(&self) -> Option<i32> {
        match self {
            BuildError::RangeExceeded { year, .. }
            | BuildError::BracketNotFound { year, .. }
            | BuildError::IncompleteYear { year, .. }
            | BuildError::InvalidTable { year, .. }
            | BuildError::Ephemeris { year, .. } => Some(*year),
            BuildError::InvalidOptions(_) => None,
        }
    }

    /// Failures that one wider search window might cure.
    pub fn is_widenable(&self) -> bool {
        matches!(
            self,
            BuildError::BracketNotFound { .. } | BuildError::IncompleteYear { .. }
        )
    }
}

/// Serving-path failure; surfaced to the caller unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DerivationError {
    #[error("no valid solar-term table for year {year}: {reason}")]
    MissingTermData { year: i32, reason: String },

    #[error("invalid birth input: {0}")]
    InvalidBirthInput(String),
}

/// Persistence failures of the term table store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported schema version {found} (expected {expected})")]
    SchemaVersion { found: u32, expected: u32 },

    #[error("year key {0:?} is not an integer")]
    InvalidYearKey(String),

    #[error("could not replace {path}: {source}")]
    Persist {
        path: String,
        #[source]
        source: tempfile::PersistError,
    },
}

/// Builder configuration could not be read or is inconsistent.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("environment variable {var}={value:?} is not valid: {reason}")]
    InvalidEnv {
        var: String,
        value: String,
        reason: String,
    },

    #[error("could not read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config file is not valid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
