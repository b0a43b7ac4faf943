//! Data providers and cleaning

pub mod clean;
pub mod ingest;
pub mod provider;
pub mod synthetic;
pub mod yahoo;

pub use clean::{clean, CleanOutcome, CleanStats, EmptyReason};
pub use ingest::FileProvider;
pub use provider::{DataError, DataProvider, DataSource, FetchResult, RawBar};
pub use synthetic::SyntheticProvider;
pub use yahoo::YahooProvider;
