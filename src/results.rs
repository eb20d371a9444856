use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::cascade::{round2, CascadeResult, CascadeSummary, StageTotals};
use crate::node::SignalNode;

const STAGE_HEADER: [&str; 9] = [
    "Block Name",
    "Gain (dB)",
    "NF (dB)",
    "IIP3 (dBm)",
    "P1dB (dBm)",
    "Total Gain (dB)",
    "Total NF (dB)",
    "Total IIP3 (dBm)",
    "Total P1dB (dBm)",
];

const COLUMN_WIDTH: usize = 16;

/// Comma separated report: system totals first, then one row per stage.
pub fn csv_lines(result: &CascadeResult) -> Vec<String> {
    let mut lines = vec!["Total Results".to_string()];
    if let Some(summary) = &result.summary {
        for (key, value) in summary.entries() {
            lines.push(format!("{},{}", key, value));
        }
    }
    lines.push(String::new());
    lines.push(STAGE_HEADER.join(","));

    for stage in &result.stages {
        let values = [
            stage.gain,
            stage.noise_figure,
            stage.iip3,
            stage.p1db,
            stage.total_gain,
            stage.total_nf,
            stage.total_iip3,
            stage.total_p1db,
        ]
        .iter()
        .map(|value| round2(*value).to_string())
        .collect::<Vec<String>>()
        .join(",");
        lines.push(format!("{},{}", stage.name, values));
    }
    lines
}

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    summary: Option<&'a CascadeSummary>,
    stages: &'a [StageTotals],
}

/// Pretty printed JSON report: the system figures as top level keys, then a
/// `stages` array. Unbounded intercepts (+inf) are written as `null`.
pub fn to_json(result: &CascadeResult) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&JsonReport {
        summary: result.summary.as_ref(),
        stages: &result.stages,
    })
}

/// The CSV report laid out in fixed width, left aligned columns.
pub fn render_table(result: &CascadeResult) -> String {
    let mut table = String::new();
    for line in csv_lines(result) {
        for cell in line.split(',') {
            table.push_str(&format!("{:<width$}", cell, width = COLUMN_WIDTH));
        }
        table.push('\n');
    }
    table
}

/// Signal level at every node of a stimulus run.
pub fn render_levels(nodes: &[SignalNode]) -> String {
    let mut text = String::new();
    for (i, node) in nodes.iter().enumerate() {
        // `{:>8.2}` aligns positive and negative numbers on the decimal
        text.push_str(&format!(
            "Node {:<3} {:<32} {:>8.2} dBm  {:>8.2} dB{}\n",
            i,
            node.name,
            node.power.as_dbm(),
            node.cumulative_gain,
            if node.is_compressed { "  (compressed)" } else { "" }
        ));
    }
    text
}

fn report_target(path: &Path, chain: &str, extension: &str) -> PathBuf {
    if path.is_dir() {
        path.join(format!("rf_cascade_results_{}.{}", chain, extension))
    } else {
        path.to_path_buf()
    }
}

/// Write `lines` to `path`. A directory gets `rf_cascade_results_<chain>.csv` inside it.
pub fn save_csv(path: &Path, chain: &str, lines: &[String]) -> Result<PathBuf, std::io::Error> {
    let target = report_target(path, chain, "csv");

    let mut file = File::create(&target)?;
    for line in lines {
        writeln!(file, "{}", line)?;
    }
    tracing::info!(path = %target.display(), "saved cascade results");
    Ok(target)
}

/// Write a [`to_json`] report to `path`. A directory gets
/// `rf_cascade_results_<chain>.json` inside it.
pub fn save_json(path: &Path, chain: &str, json: &str) -> Result<PathBuf, std::io::Error> {
    let target = report_target(path, chain, "json");

    let mut file = File::create(&target)?;
    writeln!(file, "{}", json)?;
    tracing::info!(path = %target.display(), "saved cascade results");
    Ok(target)
}
