//! End-to-end scenarios for the analysis orchestrator.
//!
//! A: empty input → NoData
//! B: a full year of valid bars → features, summary and five forecast points
//! C: 55 bars → summary populated, forecast insufficient
//! D: constant closes → summary populated, forecast fit failure

use chrono::{Datelike, NaiveDate, Weekday};
use proptest::prelude::*;

use barcast_core::data::{DataSource, EmptyReason, RawBar, SyntheticProvider};
use barcast_core::forecast::{ForecastConfig, UnavailableReason};
use barcast_runner::{run, run_analysis, AnalysisConfig, AnalysisError};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn synthetic_2023(n: usize) -> Vec<RawBar> {
    let mut bars = SyntheticProvider::new().generate("SPY", d(2023, 1, 1), d(2023, 12, 31));
    bars.truncate(n);
    bars
}

fn constant_bars(n: usize) -> Vec<RawBar> {
    let mut date = d(2023, 1, 2);
    let mut bars = Vec::with_capacity(n);
    while bars.len() < n {
        if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            bars.push(RawBar::complete(date, 400.0, 400.0, 400.0, 400.0, 1_000_000));
        }
        date = date.succ_opt().unwrap();
    }
    bars
}

#[test]
fn scenario_a_empty_input_is_no_data() {
    let err = run("SPY", 2023, vec![], DataSource::YahooFinance, &ForecastConfig::default())
        .unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::NoData {
            reason: EmptyReason::NoRows,
            ..
        }
    ));
}

#[test]
fn scenario_b_full_year_forecasts_five_points() {
    let result = run(
        "SPY",
        2023,
        synthetic_2023(252),
        DataSource::Synthetic,
        &ForecastConfig::default(),
    )
    .unwrap();

    assert_eq!(result.features.len(), 252);
    let ma20 = result.features.ma20();
    assert!(ma20[..19].iter().all(Option::is_none));
    assert!(ma20[19..].iter().all(Option::is_some));
    assert_eq!(result.summary.row_count, 252);
    assert_eq!(result.summary.head_rows.len(), 5);

    let points = result.forecast.points();
    assert_eq!(points.len(), 5, "{:?}", result.forecast);
    let last = result.summary.last_date.unwrap();
    assert!(points[0].date > last);
    for pair in points.windows(2) {
        assert!(pair[0].date < pair[1].date);
    }
    for p in points {
        assert!(!matches!(p.date.weekday(), Weekday::Sat | Weekday::Sun));
    }
    assert!(result.is_synthetic());
    assert_eq!(result.dataset_hash.len(), 64);
}

#[test]
fn scenario_c_short_year_has_no_forecast() {
    let result = run(
        "SPY",
        2023,
        synthetic_2023(55),
        DataSource::Synthetic,
        &ForecastConfig::default(),
    )
    .unwrap();

    assert_eq!(result.summary.row_count, 55);
    assert_eq!(
        result.forecast.unavailable_reason(),
        Some(&UnavailableReason::InsufficientData {
            observations: 55,
            required: 61
        })
    );
}

#[test]
fn scenario_d_constant_close_fails_fit_but_keeps_summary() {
    let result = run(
        "SPY",
        2023,
        constant_bars(200),
        DataSource::CsvImport,
        &ForecastConfig::default(),
    )
    .unwrap();

    assert_eq!(result.features.len(), 200);
    assert_eq!(result.summary.row_count, 200);
    assert_eq!(result.features.ma50()[199], Some(400.0));
    assert!(matches!(
        result.forecast.unavailable_reason(),
        Some(UnavailableReason::FitFailed { .. })
    ));
}

#[test]
fn years_run_independently_in_parallel() {
    use rayon::prelude::*;

    let provider = SyntheticProvider::new();
    let config = AnalysisConfig::default();
    let years = [2019, 2020, 2021, 2022];

    let parallel: Vec<_> = years
        .par_iter()
        .map(|&y| run_analysis(&provider, "SPY", y, &config).unwrap())
        .collect();
    let sequential: Vec<_> = years
        .iter()
        .map(|&y| run_analysis(&provider, "SPY", y, &config).unwrap())
        .collect();

    assert_eq!(parallel, sequential);
    for (result, year) in parallel.iter().zip(years) {
        assert_eq!(result.year, year);
        assert!(result.features.rows().iter().all(|r| r.bar.date.year() == year));
    }
    let mut hashes: Vec<_> = parallel.iter().map(|r| r.dataset_hash.clone()).collect();
    hashes.sort();
    hashes.dedup();
    assert_eq!(hashes.len(), years.len(), "each year should get its own data");
}

proptest! {
    /// Bars outside the requested year are discarded and counted, never analyzed.
    #[test]
    fn out_of_year_bars_are_counted(
        before in 0usize..10,
        inside in 1usize..40,
        after in 0usize..10,
    ) {
        let flat = |start: NaiveDate, i: usize, price: f64| {
            let date = start + chrono::Duration::days(i as i64);
            RawBar::complete(date, price, price, price, price, 1)
        };
        let mut raw = Vec::new();
        raw.extend((0..before).map(|i| flat(d(2022, 12, 1), i, 1.0)));
        raw.extend((0..inside).map(|i| flat(d(2023, 3, 1), i, 2.0)));
        raw.extend((0..after).map(|i| flat(d(2024, 1, 2), i, 3.0)));

        let result = run("SPY", 2023, raw, DataSource::CsvImport, &ForecastConfig::default())
            .unwrap();
        prop_assert_eq!(result.out_of_year, before + after);
        prop_assert_eq!(result.summary.row_count, inside);
        prop_assert_eq!(result.clean_stats.input_rows, inside);
    }
}
