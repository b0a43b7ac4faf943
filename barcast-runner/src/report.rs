//! Text and Markdown rendering of an `AnalysisResult`.
//!
//! Pure string building over plain data; nothing here touches the filesystem.

use barcast_core::domain::Bar;
use barcast_core::forecast::ForecastResult;
use barcast_core::stats::{ColumnStats, SummaryReport};

use crate::analysis::AnalysisResult;

// ─── Text report ────────────────────────────────────────────────────

/// Plain-text report for terminal output.
pub fn render_text(result: &AnalysisResult) -> String {
    let mut out = String::with_capacity(2048);
    let s = &result.summary;

    out.push_str(&format!("{} {} ({})\n", result.symbol, result.year, source_label(result)));
    out.push_str(&format!(
        "Rows: {}  Columns: {}  Range: {} .. {}\n",
        s.row_count,
        s.column_count,
        opt_date(s.first_date),
        opt_date(s.last_date)
    ));
    for warning in &result.data_quality_warnings {
        out.push_str(&format!("warning: {warning}\n"));
    }

    out.push_str("\nFirst rows\n");
    out.push_str(&format!(
        "{:<10}  {:>10}  {:>10}  {:>10}  {:>10}  {:>12}\n",
        "date", "open", "high", "low", "close", "volume"
    ));
    for bar in &s.head_rows {
        out.push_str(&text_bar_row(bar));
    }

    out.push_str("\nStatistics\n");
    out.push_str(&format!(
        "{:<8}  {:>6}  {:>12}  {:>12}  {:>12}  {:>12}  {:>12}  {:>12}  {:>12}\n",
        "column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
    ));
    for (name, stats) in stat_rows(s) {
        out.push_str(&format!(
            "{:<8}  {:>6}  {:>12.4}  {:>12}  {:>12.4}  {:>12.4}  {:>12.4}  {:>12.4}  {:>12.4}\n",
            name,
            stats.count,
            stats.mean,
            stats.std.map_or_else(|| "-".to_string(), |v| format!("{v:.4}")),
            stats.min,
            stats.p25,
            stats.p50,
            stats.p75,
            stats.max
        ));
    }

    out.push_str("\nForecast\n");
    match &result.forecast {
        ForecastResult::Available {
            points,
            diagnostics,
            ..
        } => {
            for p in points {
                out.push_str(&format!("{}  {:>12.4}\n", p.date, p.predicted_close));
            }
            let (ar_p, d, q) = diagnostics.order;
            out.push_str(&format!(
                "ARIMA({ar_p},{d},{q}) via {}  sigma2={:.6}  AIC={:.3}  iterations={}\n",
                diagnostics.method, diagnostics.sigma2, diagnostics.aic, diagnostics.iterations
            ));
        }
        ForecastResult::Unavailable { reason } => {
            out.push_str(&format!("unavailable: {reason}\n"));
        }
    }

    out
}

fn text_bar_row(bar: &Bar) -> String {
    format!(
        "{:<10}  {:>10.4}  {:>10.4}  {:>10.4}  {:>10.4}  {:>12}\n",
        bar.date, bar.open, bar.high, bar.low, bar.close, bar.volume
    )
}

// ─── Markdown report ────────────────────────────────────────────────

/// Markdown report for a single analysis.
pub fn render_markdown(result: &AnalysisResult) -> String {
    let s = &result.summary;
    let mut md = String::with_capacity(4096);

    md.push_str(&format!("# {} Analysis Report: {}\n\n", result.symbol, result.year));

    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Symbol | {} |\n", result.symbol));
    md.push_str(&format!("| Year | {} |\n", result.year));
    md.push_str(&format!(
        "| Period | {} to {} |\n",
        opt_date(s.first_date),
        opt_date(s.last_date)
    ));
    md.push_str(&format!("| Rows | {} |\n", s.row_count));
    md.push_str(&format!("| Columns | {} |\n", s.column_count));
    md.push_str(&format!("| Dataset Hash | {} |\n", result.dataset_hash));
    if result.is_synthetic() {
        md.push_str("| Data | **SYNTHETIC** |\n");
    }
    md.push('\n');

    if !result.data_quality_warnings.is_empty() {
        md.push_str("## Data Quality\n\n");
        for warning in &result.data_quality_warnings {
            md.push_str(&format!("- {warning}\n"));
        }
        md.push('\n');
    }

    md.push_str("## First Rows\n\n");
    md.push_str("| Date | Open | High | Low | Close | Volume |\n");
    md.push_str("| --- | --- | --- | --- | --- | --- |\n");
    for bar in &s.head_rows {
        md.push_str(&format!(
            "| {} | {:.2} | {:.2} | {:.2} | {:.2} | {} |\n",
            bar.date, bar.open, bar.high, bar.low, bar.close, bar.volume
        ));
    }
    md.push('\n');

    md.push_str("## Descriptive Statistics\n\n");
    md.push_str("| Column | Count | Mean | Std | Min | 25% | 50% | 75% | Max |\n");
    md.push_str("| --- | --- | --- | --- | --- | --- | --- | --- | --- |\n");
    for (name, stats) in stat_rows(s) {
        md.push_str(&format!(
            "| {} | {} | {:.4} | {} | {:.4} | {:.4} | {:.4} | {:.4} | {:.4} |\n",
            name,
            stats.count,
            stats.mean,
            stats.std.map_or_else(|| "n/a".to_string(), |v| format!("{v:.4}")),
            stats.min,
            stats.p25,
            stats.p50,
            stats.p75,
            stats.max
        ));
    }
    md.push('\n');

    md.push_str("## Forecast\n\n");
    match &result.forecast {
        ForecastResult::Available {
            points,
            horizon,
            diagnostics,
        } => {
            md.push_str(&format!("Next {horizon} business days:\n\n"));
            md.push_str("| Date | Predicted Close |\n");
            md.push_str("| --- | --- |\n");
            for p in points {
                md.push_str(&format!("| {} | {:.4} |\n", p.date, p.predicted_close));
            }
            md.push('\n');

            let (ar_p, d, q) = diagnostics.order;
            md.push_str("### Model\n\n");
            md.push_str("| Field | Value |\n");
            md.push_str("| --- | --- |\n");
            md.push_str(&format!("| Order | ARIMA({ar_p},{d},{q}) |\n"));
            md.push_str(&format!("| Method | {} |\n", diagnostics.method));
            let coefs: Vec<String> = diagnostics
                .ar_coefficients
                .iter()
                .map(|c| format!("{c:.5}"))
                .collect();
            md.push_str(&format!("| AR | {} |\n", coefs.join(", ")));
            md.push_str(&format!("| Sigma^2 | {:.6} |\n", diagnostics.sigma2));
            md.push_str(&format!("| Log-likelihood | {:.3} |\n", diagnostics.log_likelihood));
            md.push_str(&format!("| AIC | {:.3} |\n", diagnostics.aic));
            md.push_str(&format!(
                "| Iterations | {} ({}) |\n",
                diagnostics.iterations,
                if diagnostics.converged { "converged" } else { "not converged" }
            ));
        }
        ForecastResult::Unavailable { reason } => {
            md.push_str(&format!("_Forecast unavailable: {reason}._\n"));
        }
    }

    md
}

// ─── Helpers ────────────────────────────────────────────────────────

/// OHLCV column stats followed by the moving-average stats.
fn stat_rows(s: &SummaryReport) -> Vec<(String, &ColumnStats)> {
    s.column_stats
        .iter()
        .map(|(c, st)| (c.name().to_string(), st))
        .chain(s.indicator_stats.iter().map(|(n, st)| (n.clone(), st)))
        .collect()
}

fn opt_date(date: Option<chrono::NaiveDate>) -> String {
    date.map_or_else(|| "-".to_string(), |d| d.to_string())
}

fn source_label(result: &AnalysisResult) -> &'static str {
    use barcast_core::data::DataSource;
    match result.source {
        DataSource::YahooFinance => "Yahoo Finance",
        DataSource::CsvImport => "CSV import",
        DataSource::ParquetImport => "Parquet import",
        DataSource::Synthetic => "SYNTHETIC",
    }
}
