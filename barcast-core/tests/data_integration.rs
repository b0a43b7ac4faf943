//! Integration tests for providers feeding the cleaner and forecast engine.

use std::io::Write;

use barcast_core::data::{
    clean, CleanOutcome, DataProvider, DataSource, FileProvider, SyntheticProvider,
};
use barcast_core::features::derive_features;
use barcast_core::forecast::{forecast, ForecastConfig};
use chrono::{Datelike, NaiveDate, Weekday};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[test]
fn synthetic_year_runs_through_every_stage() {
    let provider = SyntheticProvider::new();
    let fetched = provider.fetch("SPY", d(2023, 1, 1), d(2023, 12, 31)).unwrap();
    assert_eq!(fetched.source, DataSource::Synthetic);
    assert_eq!(fetched.bars.len(), 260);

    let CleanOutcome::Clean { series, stats } = clean(&fetched.bars) else {
        panic!("synthetic bars are complete");
    };
    assert_eq!(stats.kept(), 260);

    let features = derive_features(&series);
    assert!(features.ma20()[18].is_none());
    assert!(features.ma20()[19].is_some());
    assert!(features.ma50()[49].is_some());

    let result = forecast(&series, &ForecastConfig::default());
    assert!(result.is_available(), "{result:?}");
    let first = result.points()[0].date;
    assert!(first > series.last_date().unwrap());
    assert!(!matches!(first.weekday(), Weekday::Sat | Weekday::Sun));
}

#[test]
fn csv_import_with_gaps_is_cleaned_rowwise() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(file, "Date,Open,High,Low,Close,Volume").unwrap();
    writeln!(file, "2024-03-01,10.0,11.0,9.5,10.5,1000").unwrap();
    writeln!(file, "2024-03-04,10.5,11.5,10.0,,1200").unwrap();
    writeln!(file, "2024-03-05,11.0,12.0,10.5,11.5,1300").unwrap();
    writeln!(file, "2024-03-06,11.5,12.5,11.0,12.0,").unwrap();
    writeln!(file, "2024-03-07,12.0,13.0,11.5,12.5,1500").unwrap();
    file.flush().unwrap();

    let provider = FileProvider::new(file.path());
    let fetched = provider.fetch("TEST", d(2024, 1, 1), d(2024, 12, 31)).unwrap();
    assert_eq!(fetched.bars.len(), 5);

    let outcome = clean(&fetched.bars);
    assert_eq!(outcome.stats().dropped_incomplete, 2);
    let series = outcome.series().unwrap();
    let closes = series.closes();
    assert_eq!(closes, vec![10.5, 11.5, 12.5]);
}
