//! Artifact export: CSV tables, JSON documents and the Markdown report.
//!
//! - **features.csv**: date, OHLCV, ma20, ma50 (empty cell where absent)
//! - **forecast.csv**: date, predicted_close (header only when unavailable)
//! - **summary.json**: the `SummaryReport`
//! - **result.json**: the full `AnalysisResult` with schema version
//! - **report.md**: human-readable report
//!
//! Unknown schema versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use barcast_core::features::FeatureSeries;
use barcast_core::forecast::ForecastPoint;

use crate::analysis::{AnalysisResult, SCHEMA_VERSION};
use crate::report::render_markdown;

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize an `AnalysisResult` to pretty JSON.
pub fn export_json(result: &AnalysisResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize AnalysisResult to JSON")
}

/// Deserialize an `AnalysisResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<AnalysisResult> {
    let result: AnalysisResult =
        serde_json::from_str(json).context("failed to deserialize AnalysisResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export the feature series as CSV. Absent moving averages are empty cells.
pub fn export_features_csv(features: &FeatureSeries) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "open", "high", "low", "close", "volume", "ma20", "ma50"])?;

    for row in features.rows() {
        let b = &row.bar;
        wtr.write_record([
            &b.date.to_string(),
            &format!("{:.6}", b.open),
            &format!("{:.6}", b.high),
            &format!("{:.6}", b.low),
            &format!("{:.6}", b.close),
            &b.volume.to_string(),
            &opt_cell(row.ma20),
            &opt_cell(row.ma50),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export forecast points as CSV.
pub fn export_forecast_csv(points: &[ForecastPoint]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "predicted_close"])?;
    for p in points {
        wtr.write_record([&p.date.to_string(), &format!("{:.6}", p.predicted_close)])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

fn opt_cell(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.6}")).unwrap_or_default()
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for one analysis.
///
/// Creates `{symbol}_{year}/` under `output_dir` (overwriting files from a
/// previous run of the same pair) and returns its path.
pub fn save_artifacts(result: &AnalysisResult, output_dir: &Path) -> Result<PathBuf> {
    let run_dir = output_dir.join(format!("{}_{}", result.symbol, result.year));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    write(&run_dir, "result.json", &export_json(result)?)?;

    let summary = serde_json::to_string_pretty(&result.summary)
        .context("failed to serialize SummaryReport to JSON")?;
    write(&run_dir, "summary.json", &summary)?;

    write(&run_dir, "features.csv", &export_features_csv(&result.features)?)?;
    write(&run_dir, "forecast.csv", &export_forecast_csv(result.forecast.points())?)?;
    write(&run_dir, "report.md", &render_markdown(result))?;

    tracing::debug!(dir = %run_dir.display(), "artifacts written");
    Ok(run_dir)
}

/// Load an `AnalysisResult` from an artifact directory's result.json.
pub fn load_artifacts(dir: &Path) -> Result<AnalysisResult> {
    let path = dir.join("result.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

fn write(dir: &Path, name: &str, contents: &str) -> Result<()> {
    let path = dir.join(name);
    std::fs::write(&path, contents).with_context(|| format!("failed to write {}", path.display()))
}
