use chrono::Utc;
use ganji::{
    build_year_term_table, derive_pillars, BirthMoment, BuildOptions, Vsop87Sun, Time, UT,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let now = Time::<UT>::from_utc(Utc::now());
    println!("UT: {now}");
    println!("ΔT: {}", now.delta_t());

    let sun = Vsop87Sun::default();
    let prior = build_year_term_table(&sun, 2023, &BuildOptions::default())?;
    let current = build_year_term_table(&sun, 2024, &BuildOptions::default())?;
    for term in current.terms() {
        println!(
            "{:>3}° {:<22} {}",
            term.degree,
            term.name.as_str(),
            term.instant_local.format("%Y-%m-%d %H:%M")
        );
    }

    let birth = BirthMoment::parse("2024-02-04", Some("16:00"))?;
    let pillars = derive_pillars(&birth, Some(&current), Some(&prior))?;
    println!(
        "{} {} {} {}",
        pillars.year,
        pillars.month,
        pillars.day,
        pillars.hour.map(|h| h.to_string()).unwrap_or_default()
    );
    Ok(())
}
