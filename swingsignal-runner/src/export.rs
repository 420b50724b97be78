//! Reporting and export: JSON, CSV, and Markdown artifact generation.
//!
//! Provides three export formats for backtest reports:
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: per-day signal tape and per-period evaluations
//! - **Markdown**: human-readable single-run report
//!
//! All persisted artifacts include a `schema_version` field. Unknown versions
//! are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::backtest::{BacktestReport, SCHEMA_VERSION};
use crate::evaluate::PeriodEvaluation;
use crate::replay::SignalRecord;

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestReport` to pretty JSON.
pub fn export_json(report: &BacktestReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize BacktestReport to JSON")
}

/// Deserialize a `BacktestReport` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestReport> {
    let report: BacktestReport =
        serde_json::from_str(json).context("failed to deserialize BacktestReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

fn opt(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Export the signal tape as CSV.
///
/// Columns: date, close, signal, action, confidence, market_regime,
/// rsi_state, rsi_value, macd_bias, adx_value, composite_score
pub fn export_signals_csv(records: &[SignalRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "date",
        "close",
        "signal",
        "action",
        "confidence",
        "market_regime",
        "rsi_state",
        "rsi_value",
        "macd_bias",
        "adx_value",
        "composite_score",
    ])?;

    for r in records {
        wtr.write_record([
            r.date.to_string(),
            r.close.to_string(),
            r.signal.label().to_string(),
            r.action.map(|a| a.label().to_string()).unwrap_or_default(),
            opt(r.confidence),
            r.market_regime
                .map(|m| m.label().to_string())
                .unwrap_or_default(),
            r.rsi_state.map(|s| s.label().to_string()).unwrap_or_default(),
            opt(r.rsi_value),
            r.macd_bias.map(|b| b.label().to_string()).unwrap_or_default(),
            opt(r.adx_value),
            opt(r.composite_score),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export period evaluations as CSV.
///
/// Columns: start, end, status, price_at_end, max_price, pct_change, hit, comment
pub fn export_periods_csv(evaluations: &[PeriodEvaluation]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "start",
        "end",
        "status",
        "price_at_end",
        "max_price",
        "pct_change",
        "hit",
        "comment",
    ])?;

    for e in evaluations {
        let status = serde_json::to_value(e.status)?;
        wtr.write_record([
            e.period.start.to_string(),
            e.period.end.to_string(),
            status.as_str().unwrap_or_default().to_string(),
            opt(e.price_at_end),
            opt(e.max_price),
            opt(e.pct_change),
            e.hit.map(|h| h.to_string()).unwrap_or_default(),
            e.comment.clone().unwrap_or_default(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a single backtest run.
///
/// Creates a directory named `{symbol}_{timestamp}/` under `output_dir`
/// containing:
/// - `manifest.json`: the full `BacktestReport`
/// - `signals.csv`: per-day signal tape
/// - `periods.csv`: buy-period evaluations
/// - `report.md`: Markdown summary
///
/// Returns the path to the created directory.
pub fn save_artifacts(report: &BacktestReport, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!(
        "{}_{}",
        report.symbol,
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let json = export_json(report)?;
    std::fs::write(run_dir.join("manifest.json"), &json)?;

    let signals_csv = export_signals_csv(&report.records)?;
    std::fs::write(run_dir.join("signals.csv"), &signals_csv)?;

    let periods_csv = export_periods_csv(&report.evaluations)?;
    std::fs::write(run_dir.join("periods.csv"), &periods_csv)?;

    std::fs::write(run_dir.join("report.md"), generate_report(report))?;

    Ok(run_dir)
}

/// Load a `BacktestReport` from an artifact directory's manifest.json.
///
/// Rejects unknown schema versions.
pub fn load_artifacts(dir: &Path) -> Result<BacktestReport> {
    let manifest_path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    import_json(&json)
}

// ─── Markdown reports ───────────────────────────────────────────────

fn pct(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.1}%", v * 100.0))
        .unwrap_or_else(|| "n/a".to_string())
}

/// Generate a Markdown report for a single backtest run.
pub fn generate_report(report: &BacktestReport) -> String {
    let mut md = String::with_capacity(2048);

    md.push_str("# Signal Backtest Report\n\n");

    // Metadata
    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Symbol | {} |\n", report.symbol));
    md.push_str(&format!(
        "| Period | {} to {} |\n",
        report.first_date, report.last_date
    ));
    md.push_str(&format!(
        "| Bars | {} ({} warmup) |\n",
        report.bar_count, report.min_window
    ));
    md.push_str(&format!("| Mode | {} |\n", report.mode));
    md.push_str(&format!(
        "| Lookahead | {} days, min change {:.1}% |\n",
        report.rule.evaluation_days,
        report.rule.min_change * 100.0
    ));
    md.push_str(&format!("| Max Gap | {} days |\n", report.max_gap_days));
    md.push_str(&format!("| Dataset Hash | {} |\n", report.dataset_hash));
    if !report.skipped_rows.is_empty() {
        md.push_str(&format!("| Skipped Rows | {} |\n", report.skipped_rows.len()));
    }
    md.push('\n');

    // Summary
    let s = &report.summary;
    let h = &report.signal_hit_rate;
    md.push_str("## Summary\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Signal Days | {} |\n", report.record_count));
    md.push_str(&format!("| Buy Signals | {} |\n", report.buy_signal_count));
    md.push_str(&format!("| Buy Periods | {} |\n", s.periods));
    md.push_str(&format!(
        "| Closed / Open / Missing | {} / {} / {} |\n",
        s.closed, s.open, s.not_found
    ));
    md.push_str(&format!("| Period Hits | {} |\n", s.hits));
    md.push_str(&format!("| Period Hit Rate | {} |\n", pct(s.hit_rate)));
    md.push_str(&format!(
        "| Signal Hit Rate | {} ({} of {}, {} pending) |\n",
        pct(h.hit_rate),
        h.hits,
        h.evaluated,
        h.pending
    ));
    md.push('\n');

    // Periods
    if !report.evaluations.is_empty() {
        md.push_str("## Buy Periods\n\n");
        md.push_str("| Start | End | Status | Close | Max | Change | Hit |\n");
        md.push_str("| --- | --- | --- | ---: | ---: | ---: | --- |\n");
        for e in &report.evaluations {
            let status = match &e.comment {
                Some(comment) => comment.clone(),
                None => format!("{:?}", e.status).to_lowercase(),
            };
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {} |\n",
                e.period.start,
                e.period.end,
                status,
                e.price_at_end.map(|v| format!("{v:.2}")).unwrap_or_default(),
                e.max_price.map(|v| format!("{v:.2}")).unwrap_or_default(),
                pct(e.pct_change),
                match e.hit {
                    Some(true) => "yes",
                    Some(false) => "no",
                    None => "",
                },
            ));
        }
        md.push('\n');
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EvaluationMode;
    use crate::evaluate::{EvaluationSummary, LookaheadRule, PeriodStatus, SignalHitRate};
    use crate::periods::BuyPeriod;
    use chrono::NaiveDate;
    use swingsignal_core::classify::{Bias, RsiState, Signal};
    use swingsignal_core::decision::Action;
    use swingsignal_core::regime::MarketRegime;

    fn d(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 1).unwrap() + chrono::Duration::days(n)
    }

    fn sample_record() -> SignalRecord {
        SignalRecord {
            date: d(0),
            close: 101.5,
            signal: Signal::Buy,
            action: Some(Action::Buy),
            confidence: Some(0.55),
            market_regime: Some(MarketRegime::RangeMarket),
            rsi_state: Some(RsiState::Oversold),
            rsi_value: Some(27.0),
            macd_bias: Some(Bias::None),
            adx_value: Some(15.0),
            composite_score: None,
        }
    }

    fn sample_report() -> BacktestReport {
        let evaluations = vec![
            PeriodEvaluation {
                period: BuyPeriod { start: d(0), end: d(2) },
                status: PeriodStatus::Closed,
                price_at_end: Some(100.0),
                max_price: Some(109.0),
                pct_change: Some(0.09),
                hit: Some(true),
                comment: None,
            },
            PeriodEvaluation {
                period: BuyPeriod { start: d(9), end: d(9) },
                status: PeriodStatus::DateNotFound,
                price_at_end: None,
                max_price: None,
                pct_change: None,
                hit: None,
                comment: Some("date 2024-02-10 not found in series".into()),
            },
        ];
        BacktestReport {
            schema_version: SCHEMA_VERSION,
            symbol: "TEST".into(),
            mode: EvaluationMode::Decision,
            dataset_hash: "abc123".into(),
            config_hash: "def456".into(),
            first_date: d(-20),
            last_date: d(20),
            bar_count: 41,
            min_window: 20,
            rule: LookaheadRule::new(5, 0.08),
            max_gap_days: 5,
            record_count: 1,
            buy_signal_count: 1,
            periods: evaluations.iter().map(|e| e.period).collect(),
            summary: EvaluationSummary::from_evaluations(&evaluations),
            evaluations,
            signal_hit_rate: SignalHitRate {
                evaluated: 1,
                hits: 1,
                pending: 0,
                not_found: 0,
                hit_rate: Some(1.0),
            },
            skipped_rows: vec![],
            records: vec![sample_record()],
        }
    }

    #[test]
    fn json_roundtrip() {
        let report = sample_report();
        let json = export_json(&report).unwrap();
        let back = import_json(&json).unwrap();
        assert_eq!(back.symbol, "TEST");
        assert_eq!(back.records, report.records);
        assert_eq!(back.evaluations, report.evaluations);
        assert_eq!(back.summary, report.summary);
    }

    #[test]
    fn future_schema_is_rejected() {
        let mut report = sample_report();
        report.schema_version = SCHEMA_VERSION + 1;
        let json = export_json(&report).unwrap();
        let err = import_json(&json).unwrap_err();
        assert!(err.to_string().contains("unsupported schema version"));
    }

    #[test]
    fn missing_schema_version_defaults() {
        let report = sample_report();
        let mut value = serde_json::to_value(&report).unwrap();
        value.as_object_mut().unwrap().remove("schema_version");
        let back = import_json(&value.to_string()).unwrap();
        assert_eq!(back.schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn signals_csv_columns_and_labels() {
        let csv = export_signals_csv(&[sample_record()]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("date,close,signal,action"));
        assert_eq!(lines[0].split(',').count(), 11);
        assert!(lines[1].starts_with("2024-02-01,101.5,buy,BUY,0.55,range_market,oversold,27"));
        assert!(lines[1].ends_with(",15,"));
    }

    #[test]
    fn empty_signals_csv_has_header_only() {
        let csv = export_signals_csv(&[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn periods_csv_records_comment() {
        let csv = export_periods_csv(&sample_report().evaluations).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains(",closed,"));
        assert!(lines[2].contains("date_not_found"));
        assert!(lines[2].contains("not found in series"));
    }

    #[test]
    fn report_contains_key_sections() {
        let md = generate_report(&sample_report());
        assert!(md.contains("# Signal Backtest Report"));
        assert!(md.contains("| Symbol | TEST |"));
        assert!(md.contains("| Period Hit Rate | 100.0% |"));
        assert!(md.contains("| Closed / Open / Missing | 1 / 0 / 1 |"));
        assert!(md.contains("## Buy Periods"));
        assert!(md.contains("not found in series"));
    }

    #[test]
    fn artifacts_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let report = sample_report();
        let run_dir = save_artifacts(&report, dir.path()).unwrap();

        assert!(run_dir.join("manifest.json").exists());
        assert!(run_dir.join("signals.csv").exists());
        assert!(run_dir.join("periods.csv").exists());
        assert!(run_dir.join("report.md").exists());

        let loaded = load_artifacts(&run_dir).unwrap();
        assert_eq!(loaded.dataset_hash, "abc123");
        assert_eq!(loaded.records.len(), 1);
    }
}
