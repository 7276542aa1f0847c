use analysis_core::AnalysisReport;
use std::fmt::Write as _;
use std::io::Write;

pub const CSV_HEADER: [&str; 6] = ["Symbol", "Price", "P/E", "Trust Score", "Verdict", "Rule Violations"];

/// Comma-separated failed rule names, or `None`
fn violation_list(report: &AnalysisReport) -> String {
    if let Some(err) = &report.error {
        return err.clone();
    }
    if report.rule_violations.is_empty() {
        return "None".to_string();
    }
    report
        .rule_violations
        .iter()
        .map(|v| v.rule.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn number_or_na(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", precision, v),
        None => "N/A".to_string(),
    }
}

pub fn write_csv<W: Write>(writer: W, reports: &[AnalysisReport]) -> anyhow::Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(CSV_HEADER)?;

    for report in reports {
        csv.write_record([
            report.symbol.clone(),
            number_or_na(report.price, 2),
            number_or_na(report.pe_ratio, 2),
            format!("{:.1}", report.trust_score),
            report.verdict.clone(),
            violation_list(report),
        ])?;
    }

    csv.flush()?;
    Ok(())
}

/// Human-readable report for the terminal
pub fn render_report(report: &AnalysisReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{} | {:.1} / 100 | {}", report.symbol, report.trust_score, report.verdict);

    if let Some(err) = &report.error {
        let _ = writeln!(out, "  error: {}", err);
        return out;
    }

    let _ = writeln!(
        out,
        "  price {}  P/E {}",
        number_or_na(report.price, 2),
        number_or_na(report.pe_ratio, 2)
    );

    for outcome in &report.breakdown {
        let _ = writeln!(out, "  [{}] {:<16} {}", outcome.status.as_str(), outcome.rule, outcome.detail);
    }

    if let Some(predicted) = report.predicted_return {
        let _ = writeln!(out, "  predicted return: {:+.2}%", predicted);
    }
    if let Some(reasoning) = &report.llm_reasoning {
        let _ = writeln!(out, "  analyst note: {}", reasoning);
    }

    out
}
