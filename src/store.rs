// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! JSON persistence for per-year term tables.
//!
//! On disk:
//!
//! ```json
//! {
//!   "schema_version": 1,
//!   "generator": "ganji/0.1.0",
//!   "years": { "2024": [ { "name": "minor-cold", "degree": 285, ... } ] }
//! }
//! ```
//!
//! A year whose entries fail to parse or validate is logged and treated as
//! absent; it never reaches a caller. Writes go to a temporary file in the
//! target directory which then replaces the target, so a crash mid-write
//! leaves the previous file intact.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::error::StoreError;
use crate::term::{SolarTerm, YearTermTable};

/// Version written to and required from every table file.
pub const SCHEMA_VERSION: u32 = 1;

/// `generator` field written by this build.
pub fn generator() -> String {
    format!("ganji/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Serialize)]
struct StoreFileOut<'a> {
    schema_version: u32,
    generator: String,
    years: BTreeMap<String, &'a [SolarTerm]>,
}

#[derive(Deserialize)]
struct StoreFileIn {
    schema_version: u32,
    #[serde(default)]
    generator: Option<String>,
    #[serde(default)]
    years: BTreeMap<String, serde_json::Value>,
}

/// Year-keyed collection of validated term tables backed by one JSON file.
#[derive(Debug, Clone)]
pub struct JieqiTableStore {
    path: PathBuf,
    tables: BTreeMap<i32, YearTermTable>,
    rejected: BTreeMap<i32, String>,
}

impl JieqiTableStore {
    /// Empty store that will persist to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            tables: BTreeMap::new(),
            rejected: BTreeMap::new(),
        }
    }

    /// Load `path`, or start empty when it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        match fs::read_to_string(&path) {
            Ok(contents) => Self::from_json_str(path, &contents),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("no table at {}, starting empty", path.display());
                Ok(Self::new(path))
            }
            Err(source) => Err(StoreError::Io {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    /// Parse a table document; `path` is where it will be persisted.
    pub fn from_json_str(path: impl Into<PathBuf>, contents: &str) -> Result<Self, StoreError> {
        let mut store = Self::new(path);
        let file: StoreFileIn = serde_json::from_str(contents)?;
        if file.schema_version != SCHEMA_VERSION {
            return Err(StoreError::SchemaVersion {
                found: file.schema_version,
                expected: SCHEMA_VERSION,
            });
        }

        for (key, value) in file.years {
            let year: i32 = key
                .trim()
                .parse()
                .map_err(|_| StoreError::InvalidYearKey(key.clone()))?;
            let checked = serde_json::from_value::<Vec<SolarTerm>>(value)
                .map_err(|e| e.to_string())
                .and_then(|terms| YearTermTable::new(year, terms).map_err(|e| e.to_string()));
            match checked {
                Ok(table) => {
                    store.tables.insert(year, table);
                }
                Err(reason) => {
                    log::warn!(
                        "year {year} in {} is invalid, treating as absent: {reason}",
                        store.path.display()
                    );
                    store.rejected.insert(year, reason);
                }
            }
        }

        log::info!(
            "loaded {} years from {} (generator {}, {} rejected)",
            store.tables.len(),
            store.path.display(),
            file.generator.as_deref().unwrap_or("unknown"),
            store.rejected.len()
        );
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Validated table for `year`, if one is stored.
    pub fn get(&self, year: i32) -> Option<&YearTermTable> {
        self.tables.get(&year)
    }

    pub fn contains_valid(&self, year: i32) -> bool {
        self.tables.contains_key(&year)
    }

    /// Years found on load but dropped by validation, with the reason.
    pub fn rejected(&self) -> &BTreeMap<i32, String> {
        &self.rejected
    }

    /// Add or replace a year, returning the previous table.
    pub fn insert(&mut self, table: YearTermTable) -> Option<YearTermTable> {
        self.rejected.remove(&table.year());
        self.tables.insert(table.year(), table)
    }

    /// Stored years in ascending order.
    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.tables.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Serialize the valid years. Rejected years are not written back.
    pub fn to_json_string(&self) -> Result<String, StoreError> {
        let out = StoreFileOut {
            schema_version: SCHEMA_VERSION,
            generator: generator(),
            years: self
                .tables
                .iter()
                .map(|(year, table)| (year.to_string(), table.terms()))
                .collect(),
        };
        Ok(serde_json::to_string_pretty(&out)?)
    }

    /// Atomically replace the file at [`path`](Self::path).
    pub fn persist(&self) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.display().to_string(),
            source,
        };

        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(io_err)?;

        let json = self.to_json_string()?;
        let mut tmp = NamedTempFile::new_in(&dir).map_err(io_err)?;
        tmp.write_all(json.as_bytes()).map_err(io_err)?;
        tmp.write_all(b"\n").map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|source| StoreError::Persist {
            path: self.path.display().to_string(),
            source,
        })?;

        log::debug!("persisted {} years to {}", self.len(), self.path.display());
        Ok(())
    }
}
