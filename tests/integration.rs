use chrono::{Datelike, Duration, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use qtty::{Day, Days, Degrees, Second, Seconds};

use ganji::{
    build_year_term_table, derive_pillars, BirthMoment, BuildError, BuildOptions,
    EphemerisProvider, JieqiTableStore, JobState, JobTracker, LinearSun, Vsop87Sun, Period,
    SolarTermName, SolarTermScanner, Time, YearTermTable, YearTermTableBuilder, UT,
};

fn built(year: i32) -> YearTermTable {
    build_year_term_table(Vsop87Sun::default(), year, &BuildOptions::default())
        .unwrap_or_else(|e| panic!("{year}: {e}"))
}

fn signed_difference(a: f64, b: f64) -> f64 {
    (a - b + 540.0).rem_euclid(360.0) - 180.0
}

#[test]
fn built_year_satisfies_table_properties() {
    let table = built(2024);
    let terms = table.terms();
    assert_eq!(terms.len(), 24);

    let mut degrees: Vec<u16> = terms.iter().map(|t| t.degree).collect();
    degrees.sort_unstable();
    assert_eq!(degrees, (0..24).map(|i| i * 15).collect::<Vec<u16>>());

    assert!(terms.windows(2).all(|w| w[0].instant_utc < w[1].instant_utc));
    assert!(terms.iter().all(|t| t.instant_local.year() == 2024));
    assert_eq!(terms[0].name, SolarTermName::MinorCold);
    assert_eq!(terms[23].name, SolarTermName::WinterSolstice);

    for w in terms.windows(2) {
        let days = (w[1].instant_utc - w[0].instant_utc).num_minutes() as f64 / 1440.0;
        assert!((10.0..=20.0).contains(&days), "{} → {}: {days}", w[0].name, w[1].name);
    }
}

#[test]
fn longitude_at_each_instant_matches_its_degree() {
    let sun = Vsop87Sun::default();
    for term in built(2024).terms() {
        let lon = sun
            .apparent_solar_longitude(Time::<UT>::from_utc(term.instant_utc))
            .unwrap();
        let error = signed_difference(lon.value(), f64::from(term.degree));
        // instants are stored to the millisecond
        assert!(error.abs() < 1e-6, "{}: {error}", term.name);
    }
}

#[test]
fn built_year_agrees_with_published_instants() {
    // KST instants from the Korea Astronomy and Space Science Institute, 2024
    let table = built(2024);
    let published = [
        (SolarTermName::MinorCold, (1, 6, 5, 49)),
        (SolarTermName::StartOfSpring, (2, 4, 17, 27)),
        (SolarTermName::SpringEquinox, (3, 20, 12, 6)),
        (SolarTermName::SummerSolstice, (6, 21, 5, 51)),
        (SolarTermName::AutumnEquinox, (9, 22, 21, 44)),
        (SolarTermName::WinterSolstice, (12, 21, 18, 21)),
    ];
    for (name, (m, d, h, min)) in published {
        let want = ganji::kst().with_ymd_and_hms(2024, m, d, h, min, 0).unwrap();
        let got = table.get(name).unwrap().instant_local;
        let off = (got - want).num_seconds().abs();
        assert!(off <= 60, "{name}: {got} vs {want} ({off} s)");
    }
}

#[test]
fn linear_model_recovers_every_crossing() {
    let epoch = Time::<UT>::new(2_460_000.0);
    let rate = 360.0 / 365.242_19;
    let sun = LinearSun::new(epoch, Degrees::new(0.0), rate);
    let window = Period::new(epoch + Days::new(1.0), epoch + Days::new(366.0));
    let hits = SolarTermScanner::new(&sun).scan(window).unwrap();
    assert_eq!(hits.len(), 24);

    for hit in hits {
        let degree = f64::from(hit.name.degree());
        // phase 0 at the epoch: 0° recurs one full turn later
        let unwrapped = if degree == 0.0 { 360.0 } else { degree };
        let want = sun.instant_of(Degrees::new(unwrapped));
        let error = (hit.instant - want).abs().to::<Second>();
        assert!(error < Seconds::new(0.05), "{}: {} s", hit.name, error.value());
    }
}

#[test]
fn kst_new_year_edge_is_respected() {
    // terms after 15:00 UTC on 31 December belong to the next local year
    for year in [1986, 2000, 2049] {
        let table = built(year);
        assert!(table.terms().iter().all(|t| t.local_year() == year));
        assert_eq!(table.terms().len(), 24);
    }
}

#[test]
fn batch_run_persists_and_respects_append() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("jieqi.json");
    let tracker = JobTracker::new();

    let options = BuildOptions {
        workers: 2,
        ..BuildOptions::default()
    };
    let builder = YearTermTableBuilder::new(Vsop87Sun::default(), options).unwrap();
    let mut store = JieqiTableStore::open(&path).unwrap();
    let report = builder.run(2023..=2025, &mut store, &tracker).unwrap();
    assert_eq!(report.built, vec![2023, 2024, 2025]);
    assert!(report.is_ok());

    let status = tracker.snapshot();
    assert_eq!(status.state, JobState::Finished);
    assert_eq!(status.ok, Some(true));
    assert_eq!(status.built, 3);

    let mut reopened = JieqiTableStore::open(&path).unwrap();
    assert_eq!(reopened.years().collect::<Vec<_>>(), vec![2023, 2024, 2025]);

    let again = builder.run(2023..=2025, &mut reopened, &tracker).unwrap();
    assert!(again.built.is_empty());
    assert_eq!(again.skipped, vec![2023, 2024, 2025]);

    let forced = YearTermTableBuilder::new(
        Vsop87Sun::default(),
        BuildOptions {
            force_rebuild: true,
            ..BuildOptions::default()
        },
    )
    .unwrap();
    let rebuilt = forced.run(2024..=2024, &mut reopened, &tracker).unwrap();
    assert_eq!(rebuilt.built, vec![2024]);
}

#[test]
fn failing_year_does_not_stop_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("jieqi.json");
    let start = Utc.with_ymd_and_hms(2022, 6, 1, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap();
    let sun = Vsop87Sun::new(Period::from_utc(start, end));

    let builder = YearTermTableBuilder::new(sun, BuildOptions::default()).unwrap();
    let tracker = JobTracker::new();
    let mut store = JieqiTableStore::new(&path);
    let report = builder.run(2023..=2025, &mut store, &tracker).unwrap();

    assert_eq!(report.built, vec![2023, 2024]);
    assert_eq!(report.bad_years(), vec![2025]);
    assert!(matches!(
        report.failed[0].1,
        BuildError::IncompleteYear { year: 2025, .. }
    ));
    assert_eq!(tracker.snapshot().ok, Some(false));

    let reopened = JieqiTableStore::open(&path).unwrap();
    assert_eq!(reopened.years().collect::<Vec<_>>(), vec![2023, 2024]);
}

#[test]
fn pillars_from_built_tables() {
    let current = built(2024);
    let prior = built(2023);

    // 2024-02-04 17:27 KST is start-of-spring
    let before = BirthMoment::parse("2024-02-04", Some("16:00")).unwrap();
    let after = BirthMoment::parse("2024-02-04", Some("19:00")).unwrap();
    let a = derive_pillars(&before, Some(&current), Some(&prior)).unwrap();
    let b = derive_pillars(&after, Some(&current), Some(&prior)).unwrap();
    assert_eq!(a.year.label(), "癸卯");
    assert_eq!(a.month.label(), "乙丑");
    assert_eq!(b.year.label(), "甲辰");
    assert_eq!(b.month.label(), "丙寅");
    assert_eq!(a.day, b.day);

    // five minutes either side of 17:27
    let close_before = BirthMoment::parse("2024-02-04", Some("17:22")).unwrap();
    let close_after = BirthMoment::parse("2024-02-04", Some("17:32")).unwrap();
    let c = derive_pillars(&close_before, Some(&current), Some(&prior)).unwrap();
    let d = derive_pillars(&close_after, Some(&current), Some(&prior)).unwrap();
    assert_eq!(c.year.label(), "癸卯");
    assert_eq!(c.month.label(), "乙丑");
    assert_eq!(d.year.label(), "甲辰");
    assert_eq!(d.month.label(), "丙寅");

    // before minor-cold the prior year's 子 month is still running
    let new_year = BirthMoment::parse("2024-01-01", Some("12:00")).unwrap();
    let e = derive_pillars(&new_year, Some(&current), Some(&prior)).unwrap();
    assert_eq!(e.month.label(), "甲子");
    assert_eq!(e.day.label(), "甲子");
    assert_eq!(e.hour.unwrap().label(), "庚午");
}

fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (0i64..200 * 366).prop_map(|offset| {
        NaiveDate::from_ymd_opt(1900, 1, 1).unwrap() + Duration::days(offset)
    })
}

proptest! {
    #[test]
    fn day_pillar_has_period_sixty(date in date_strategy()) {
        let here = ganji::pillars::day_pillar(date);
        let later = ganji::pillars::day_pillar(date + Duration::days(60));
        let next = ganji::pillars::day_pillar(date + Duration::days(1));
        prop_assert_eq!(here, later);
        prop_assert_eq!(next.index(), (here.index() + 1) % 60);
    }

    #[test]
    fn jdn_agrees_with_chrono(date in date_strategy()) {
        let jdn = ganji::pillars::julian_day_number(date.year(), date.month(), date.day());
        prop_assert_eq!(jdn, i64::from(date.num_days_from_ce()) + 1_721_425);
    }

    #[test]
    fn year_pillar_repeats_every_sixty_years(year in 1000i32..3000) {
        prop_assert_eq!(ganji::pillars::year_pillar(year), ganji::pillars::year_pillar(year + 60));
        prop_assert_eq!(ganji::pillars::year_pillar(year).index() as i32, (year - 1984).rem_euclid(60));
    }

    #[test]
    fn year_is_stable_on_each_side_of_start_of_spring(minutes in 1i64..20_000) {
        let table = current_table();
        let spring = table.start_of_spring().instant_local.naive_local();
        let before = spring - Duration::minutes(minutes);
        let after = spring + Duration::minutes(minutes);
        prop_assume!(before.year() == 2024);
        let at = |t: chrono::NaiveDateTime| {
            let birth = BirthMoment::new(t.date(), Some(t.time()));
            derive_pillars(&birth, Some(table), None).unwrap().year
        };
        prop_assert_eq!(at(before).label(), "癸卯");
        prop_assert_eq!(at(after).label(), "甲辰");
    }

    #[test]
    fn unwrapped_track_never_decreases(
        phase in 0.0f64..360.0,
        rate in 0.5f64..1.5,
    ) {
        let epoch = Time::<UT>::new(2_460_000.0);
        let sun = LinearSun::new(epoch, Degrees::new(phase), rate);
        let raw: Vec<ganji::Sample> = (0..400)
            .map(|i| {
                let t = epoch + qtty::Hours::new(6.0 * i as f64).to::<Day>();
                ganji::Sample::new(t, sun.apparent_solar_longitude(t).unwrap())
            })
            .collect();
        let track = ganji::UnwrappedTrack::from_raw(&raw);
        prop_assert!(track.samples().windows(2).all(|w| w[0].longitude <= w[1].longitude));
        let span = track.max().unwrap().value() - track.min().unwrap().value();
        let expected = rate * 399.0 * 0.25;
        prop_assert!((span - expected).abs() < 1e-6);
    }
}

fn current_table() -> &'static YearTermTable {
    use std::sync::OnceLock;
    static TABLE: OnceLock<YearTermTable> = OnceLock::new();
    TABLE.get_or_init(|| built(2024))
}
