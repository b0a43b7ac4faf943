//! Domain types for barcast

pub mod bar;
pub mod series;

pub use bar::{Bar, Column};
pub use series::{CleanSeries, SeriesError};
