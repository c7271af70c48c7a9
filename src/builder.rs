// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Offline construction of per-year term tables.
//!
//! [`build_year_term_table`] turns one calendar year into a validated
//! [`YearTermTable`]. [`YearTermTableBuilder`] runs it over a range of years,
//! persisting the store after every year so an interrupted run keeps what it
//! finished.

use chrono::{Datelike, NaiveDate, TimeZone, Timelike, Utc};
use parking_lot::Mutex;
use qtty::{Days, Hours};
use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::ephemeris::EphemerisProvider;
use crate::error::{BuildError, StoreError};
use crate::job::{JobTracker, YearOutcome};
use crate::scanner::{
    is_valid_step, ScanConfig, SolarTermScanner, TermHit, MAX_STEP_HOURS, MIN_STEP_HOURS,
};
use crate::store::JieqiTableStore;
use crate::term::{kst, SolarTerm, SolarTermName, YearTermTable, TERMS_PER_YEAR};
use crate::{Period, UT};

/// Padding added to both ends of a year window on the single retry.
pub const WIDEN_PAD_DAYS: f64 = 30.0;

/// Number of failed years listed in the end-of-run summary.
const SUMMARY_YEARS: usize = 20;

/// Knobs for building tables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildOptions {
    pub step: Hours,
    /// Keep years already valid in the store.
    pub append: bool,
    /// Rebuild years even when `append` would keep them.
    pub force_rebuild: bool,
    /// Retry a failed year once over a window widened by [`WIDEN_PAD_DAYS`].
    pub widen_on_failure: bool,
    pub workers: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            step: Hours::new(6.0),
            append: true,
            force_rebuild: false,
            widen_on_failure: true,
            workers: 1,
        }
    }
}

impl BuildOptions {
    pub fn validate(&self) -> Result<(), BuildError> {
        let step = self.step.value();
        if !is_valid_step(step) {
            return Err(BuildError::InvalidOptions(format!(
                "step_hours must be in [{MIN_STEP_HOURS:.4}, {MAX_STEP_HOURS}], got {step}"
            )));
        }
        if self.workers == 0 {
            return Err(BuildError::InvalidOptions("workers must be at least 1".into()));
        }
        Ok(())
    }

    /// Whether an existing valid table for a year should be kept.
    pub fn keeps_existing(&self) -> bool {
        self.append && !self.force_rebuild
    }
}

/// Years whose search window the calendar can represent.
pub fn buildable_years() -> RangeInclusive<i32> {
    (NaiveDate::MIN.year() + 1)..=(NaiveDate::MAX.year() - 1)
}

/// Search window for `year`: local 15 December of the previous year through
/// local 31 January of the next, both at 00:00 UTC+9.
pub fn year_window(year: i32) -> Result<Period<UT>, BuildError> {
    let tz = kst();
    let start = year
        .checked_sub(1)
        .and_then(|y| tz.with_ymd_and_hms(y, 12, 15, 0, 0, 0).single());
    let end = year
        .checked_add(1)
        .and_then(|y| tz.with_ymd_and_hms(y, 1, 31, 0, 0, 0).single());
    match (start, end) {
        (Some(start), Some(end)) => Ok(Period::from_utc(
            start.with_timezone(&Utc),
            end.with_timezone(&Utc),
        )),
        _ => Err(BuildError::RangeExceeded {
            year,
            detail: "year is outside the representable calendar".into(),
        }),
    }
}

/// Locate the 24 terms whose local instant falls in `year`.
///
/// A year that fails with [`BuildError::BracketNotFound`] or
/// [`BuildError::IncompleteYear`] is retried once over a wider window when
/// `options.widen_on_failure` is set.
pub fn build_year_term_table<P: EphemerisProvider>(
    provider: P,
    year: i32,
    options: &BuildOptions,
) -> Result<YearTermTable, BuildError> {
    options.validate()?;
    let window = year_window(year)?;
    match build_in_window(&provider, year, window, options) {
        Err(e) if options.widen_on_failure && e.is_widenable() => {
            log::warn!("{e}; retrying with the window widened by {WIDEN_PAD_DAYS} days");
            build_in_window(&provider, year, window.widen(Days::new(WIDEN_PAD_DAYS)), options)
        }
        other => other,
    }
}

fn build_in_window<P: EphemerisProvider>(
    provider: &P,
    year: i32,
    window: Period<UT>,
    options: &BuildOptions,
) -> Result<YearTermTable, BuildError> {
    let scanner = SolarTermScanner::with_config(provider, ScanConfig::default().with_step(options.step));
    let hits = scanner
        .scan(window)
        .map_err(|e| BuildError::from_scan(year, e))?;
    assemble_year(year, hits)
}

/// Keep the hits whose local instant falls in `year`, collapse repeats and
/// validate the result. `hits` must be sorted by instant.
fn assemble_year(year: i32, hits: Vec<TermHit>) -> Result<YearTermTable, BuildError> {
    let mut terms = Vec::with_capacity(TERMS_PER_YEAR);
    for hit in hits {
        let utc = hit.instant.to_utc().ok_or_else(|| BuildError::RangeExceeded {
            year,
            detail: format!("{} has no UTC representation", hit.instant),
        })?;
        let term = SolarTerm::new(hit.name, utc);
        if term.local_year() == year {
            terms.push(term);
        }
    }

    // hits are time ordered, so a repeat lands next to its twin
    terms.dedup_by(|next, kept| next.name == kept.name && same_local_minute(next, kept));

    let distinct: HashSet<_> = terms.iter().map(|t| t.name).collect();
    if terms.len() != TERMS_PER_YEAR || distinct.len() != TERMS_PER_YEAR {
        let mut missing: Vec<_> = SolarTermName::ALL
            .into_iter()
            .filter(|n| !distinct.contains(n))
            .map(|n| n.as_str())
            .collect();
        missing.truncate(6);
        return Err(BuildError::IncompleteYear {
            year,
            found: terms.len(),
            detail: format!(
                "{} distinct names, missing [{}]",
                distinct.len(),
                missing.join(", ")
            ),
        });
    }

    YearTermTable::new(year, terms).map_err(|source| BuildError::InvalidTable { year, source })
}

fn same_local_minute(a: &SolarTerm, b: &SolarTerm) -> bool {
    let (a, b) = (a.instant_local, b.instant_local);
    a.date_naive() == b.date_naive() && a.hour() == b.hour() && a.minute() == b.minute()
}

/// Result of a batch run.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub built: Vec<i32>,
    pub skipped: Vec<i32>,
    pub failed: Vec<(i32, BuildError)>,
}

impl BuildReport {
    pub fn is_ok(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn bad_years(&self) -> Vec<i32> {
        self.failed.iter().map(|(year, _)| *year).collect()
    }

    fn sort(&mut self) {
        self.built.sort_unstable();
        self.skipped.sort_unstable();
        self.failed.sort_by_key(|(year, _)| *year);
    }
}

/// Builds a range of years into a [`JieqiTableStore`].
#[derive(Debug, Clone)]
pub struct YearTermTableBuilder<P> {
    provider: P,
    options: BuildOptions,
}

impl<P: EphemerisProvider> YearTermTableBuilder<P> {
    pub fn new(provider: P, options: BuildOptions) -> Result<Self, BuildError> {
        options.validate()?;
        Ok(Self { provider, options })
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Build every year in `years`.
    ///
    /// Failing years are reported and skipped over; only a failure to write
    /// the store aborts the run. Workers take years from a shared counter and
    /// serialize through one lock around the store.
    pub fn run(
        &self,
        years: RangeInclusive<i32>,
        store: &mut JieqiTableStore,
        tracker: &JobTracker,
    ) -> Result<BuildReport, StoreError> {
        let years: Vec<i32> = years.collect();
        let total = years.len();
        tracker.begin(total);
        log::info!(
            "building {} years into {} (append={}, force={}, step={}h, workers={})",
            total,
            store.path().display(),
            self.options.append,
            self.options.force_rebuild,
            self.options.step.value(),
            self.options.workers
        );

        let mut report = BuildReport::default();
        let mut pending = Vec::with_capacity(total);
        for (i, &year) in years.iter().enumerate() {
            if self.options.keeps_existing() && store.contains_valid(year) {
                log::info!("year {year} already present, skipping ({}/{total})", i + 1);
                tracker.record_year(year, YearOutcome::Skipped);
                report.skipped.push(year);
            } else {
                pending.push((i + 1, year));
            }
        }

        let store = Mutex::new(store);
        let report = Mutex::new(report);
        let write_error: Mutex<Option<StoreError>> = Mutex::new(None);
        let next = AtomicUsize::new(0);
        let abort = AtomicBool::new(false);
        let workers = self.options.workers.min(pending.len()).max(1);

        std::thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| loop {
                    if abort.load(Ordering::Relaxed) {
                        break;
                    }
                    let Some(&(position, year)) = pending.get(next.fetch_add(1, Ordering::Relaxed))
                    else {
                        break;
                    };

                    log::info!("processing year {year} ({position}/{total})");
                    tracker.start_year(year);
                    match build_year_term_table(&self.provider, year, &self.options) {
                        Ok(table) => {
                            let mut store = store.lock();
                            store.insert(table);
                            if let Err(e) = store.persist() {
                                log::error!("could not persist after year {year}: {e}");
                                let mut slot = write_error.lock();
                                if slot.is_none() {
                                    *slot = Some(e);
                                }
                                abort.store(true, Ordering::Relaxed);
                                tracker.record_year(year, YearOutcome::Failed);
                                break;
                            }
                            log::info!("year {year} ok ({TERMS_PER_YEAR} terms)");
                            tracker.record_year(year, YearOutcome::Built);
                            report.lock().built.push(year);
                        }
                        Err(e) => {
                            log::error!("year {year} failed: {e}");
                            tracker.record_year(year, YearOutcome::Failed);
                            report.lock().failed.push((year, e));
                        }
                    }
                });
            }
        });

        if let Some(e) = write_error.into_inner() {
            tracker.finish(false, Some(e.to_string()));
            return Err(e);
        }

        let mut report = report.into_inner();
        report.sort();
        if report.is_ok() {
            log::info!("all {} built years have {TERMS_PER_YEAR} terms", report.built.len());
            tracker.finish(true, None);
        } else {
            let bad = report.bad_years();
            let shown = &bad[..bad.len().min(SUMMARY_YEARS)];
            let more = if bad.len() > SUMMARY_YEARS { "..." } else { "" };
            let summary = format!("bad_years_count={} years={shown:?}{more}", bad.len());
            log::error!("{summary}");
            tracker.finish(false, Some(summary));
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LinearSun, Time};
    use qtty::Degrees;

    #[test]
    fn window_spans_mid_december_to_end_of_january() {
        let (start, end) = year_window(2024).unwrap().to_utc().unwrap();
        assert_eq!(start.to_rfc3339(), "2023-12-14T15:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2025-01-30T15:00:00+00:00");
    }

    #[test]
    fn unrepresentable_years_are_range_exceeded() {
        for year in [i32::MAX, i32::MIN, *buildable_years().end() + 1] {
            assert!(matches!(
                year_window(year),
                Err(BuildError::RangeExceeded { year: y, .. }) if y == year
            ));
        }
        let sun = LinearSun::new(Time::new(2_460_000.0), Degrees::new(0.0), 1.0);
        let err = build_year_term_table(&sun, i32::MAX, &BuildOptions::default()).unwrap_err();
        assert!(matches!(err, BuildError::RangeExceeded { year: i32::MAX, .. }));
        assert!(year_window(*buildable_years().end()).is_ok());
        assert!(year_window(*buildable_years().start()).is_ok());
    }

    #[test]
    fn kst_new_year_belongs_to_the_new_year() {
        let instant = Utc.with_ymd_and_hms(2023, 12, 31, 15, 30, 0).unwrap();
        let term = SolarTerm::new(SolarTermName::MinorCold, instant);
        assert_eq!(term.local_year(), 2024);
    }

    #[test]
    fn options_are_validated() {
        let bad_step = BuildOptions {
            step: Hours::new(0.0),
            ..BuildOptions::default()
        };
        assert!(matches!(bad_step.validate(), Err(BuildError::InvalidOptions(_))));
        let no_workers = BuildOptions {
            workers: 0,
            ..BuildOptions::default()
        };
        assert!(no_workers.validate().is_err());
        let tiny_step = BuildOptions {
            step: Hours::new(1e-4),
            ..BuildOptions::default()
        };
        assert!(tiny_step.validate().is_err());
        assert!(BuildOptions::default().validate().is_ok());
    }

    #[test]
    fn keeps_existing_only_in_plain_append() {
        let mut options = BuildOptions::default();
        assert!(options.keeps_existing());
        options.force_rebuild = true;
        assert!(!options.keeps_existing());
        options = BuildOptions {
            append: false,
            ..BuildOptions::default()
        };
        assert!(!options.keeps_existing());
    }

    #[test]
    fn slow_sun_gives_incomplete_year() {
        // half the real rate: only about a dozen crossings per year
        let epoch = Time::<UT>::from_utc(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let sun = LinearSun::new(epoch, Degrees::new(280.0), 0.5);
        let err = build_year_term_table(&sun, 2024, &BuildOptions::default()).unwrap_err();
        assert!(matches!(err, BuildError::IncompleteYear { year: 2024, .. }), "{err}");
    }

    #[test]
    fn uncovered_year_is_range_exceeded() {
        let epoch = Time::<UT>::from_utc(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let sun = LinearSun::new(epoch, Degrees::new(280.0), 360.0 / 365.242_19);
        let err = build_year_term_table(&sun, 2300, &BuildOptions::default()).unwrap_err();
        assert!(matches!(err, BuildError::RangeExceeded { year: 2300, .. }));
    }

    #[test]
    fn repeated_hits_collapse_to_one_term_each() {
        let epoch = Time::<UT>::from_utc(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let sun = LinearSun::new(epoch, Degrees::new(280.0), 360.0 / 365.242_19);
        let scanner = SolarTermScanner::new(&sun);
        let window = year_window(2024).unwrap();
        let (start, end) = (window.start, window.end);
        let mid = start.mean(end);

        // two overlapping halves locate the terms near the seam twice
        let mut hits = scanner.scan(Period::new(start, mid + Days::new(40.0))).unwrap();
        hits.extend(scanner.scan(Period::new(mid - Days::new(40.0), end)).unwrap());
        hits.sort_by(|a, b| a.instant.value().total_cmp(&b.instant.value()));
        let in_year = hits
            .iter()
            .filter(|h| h.instant.to_utc().unwrap().with_timezone(&kst()).year() == 2024)
            .count();
        assert!(in_year > TERMS_PER_YEAR, "{in_year}");

        let table = assemble_year(2024, hits).unwrap();
        assert_eq!(table.terms().len(), TERMS_PER_YEAR);
    }

    #[test]
    fn distinct_instants_of_one_term_are_not_merged() {
        let start = Utc.with_ymd_and_hms(2024, 1, 6, 0, 0, 0).unwrap();
        let hit = |minutes: i64| TermHit {
            name: SolarTermName::MinorCold,
            instant: Time::<UT>::from_utc(start + chrono::Duration::minutes(minutes)),
        };
        let err = assemble_year(2024, vec![hit(0), hit(0), hit(5)]).unwrap_err();
        assert!(matches!(err, BuildError::IncompleteYear { found: 2, .. }), "{err}");
    }

    #[test]
    fn mean_sun_builds_a_full_year() {
        // mean Sun through 280° at 2024-01-01 00:00 UTC
        let epoch = Time::<UT>::from_utc(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let sun = LinearSun::new(epoch, Degrees::new(280.0), 360.0 / 365.242_19);
        let table = build_year_term_table(&sun, 2024, &BuildOptions::default()).unwrap();
        assert_eq!(table.terms().len(), 24);
        assert!(table.terms().iter().all(|t| t.local_year() == 2024));
    }
}
