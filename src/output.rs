use crate::models::{EvaluationRecord, ModelId, ModelSummary, ReportSummary, RunResults};
use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum, Serialize, Deserialize)]
pub enum OutputFormat {
    Plain,
    Json,
}

/// Print evaluation results in the specified format
pub fn print_results(
    results: &RunResults,
    summaries: &[ReportSummary],
    models: &[ModelId],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Plain => {
            print!("{}", render_plain(results, summaries, models));
            Ok(())
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(results)
                .context("Failed to serialize results to JSON")?;
            println!("{}", json);
            Ok(())
        }
    }
}

/// Per-question detail followed by the summary table, for every report
pub fn render_plain(results: &RunResults, summaries: &[ReportSummary], models: &[ModelId]) -> String {
    let mut out = String::new();

    for (report_name, records) in results {
        out.push_str(&format!("\n=== RESULTS FOR REPORT: {} ===\n", report_name));
        for record in records {
            out.push_str(&render_record(record, models));
        }

        match summaries.iter().find(|s| &s.report_name == report_name) {
            Some(summary) => out.push_str(&render_summary_table(summary)),
            None => out.push_str("No data.\n"),
        }
    }

    out
}

fn render_record(record: &EvaluationRecord, models: &[ModelId]) -> String {
    let mut out = format!(
        "ID: {}\nQuestion: {}\nCorrect Answer: {}\n",
        record.id, record.question, record.expected_answer
    );

    for model in models {
        let Some(outcome) = record.outcome(model) else {
            continue;
        };
        out.push_str(&format!("\n{}:\n", model));
        out.push_str(&format!("Response: {}\n", outcome.response));
        out.push_str(&format!("Is Correct: {}\n", bool_label(outcome.is_correct)));
        out.push_str(&format!("Tokens Used: {}\n", outcome.tokens));
        out.push_str(&format!("Cost: {}\n", cost_label(outcome.cost)));
        if let Some(error) = &outcome.error {
            out.push_str(&format!("Error: {}\n", error));
        }
    }

    out.push_str(&format!("{}\n", "-".repeat(50)));
    out
}

fn bool_label(flag: bool) -> &'static str {
    if flag { "True" } else { "False" }
}

fn cost_label(cost: f64) -> String {
    format!("${:.4}", cost)
}

/// Header cells of a summary table
pub fn summary_header(summary: &ReportSummary) -> Vec<String> {
    let mut header = vec!["Model".to_string()];
    header.extend(summary.question_ids.iter().map(|id| id.to_string()));
    header.extend(
        ["%Correct", "TotalCost", "TotalTokens", "AvgTokens/Q"]
            .iter()
            .map(|h| h.to_string()),
    );
    header
}

/// Cells of one model's summary row
pub fn summary_row(row: &ModelSummary) -> Vec<String> {
    let mut cells = vec![row.model.to_string()];
    cells.extend(row.flags.iter().map(|&flag| bool_label(flag).to_string()));
    cells.push(format!("{:.1}%", row.percent_correct));
    cells.push(cost_label(row.total_cost));
    cells.push(row.total_tokens.to_string());
    cells.push(format!("{:.1}", row.avg_tokens_per_question));
    cells
}

/// Render a summary as a fixed-width console table
pub fn render_summary_table(summary: &ReportSummary) -> String {
    let header = summary_header(summary);
    let rows: Vec<Vec<String>> = summary.rows.iter().map(summary_row).collect();

    let widths: Vec<usize> = (0..header.len())
        .map(|i| {
            rows.iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.chars().count())
                .fold(header[i].chars().count(), usize::max)
        })
        .collect();

    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{:<width$}", cell, width = width))
            .collect::<Vec<_>>()
            .join(" | ")
    };

    let header_line = line(&header);
    let mut out = format!(
        "\n=== SUMMARY TABLE FOR REPORT: {} ===\n{}\n{}\n",
        summary.report_name,
        header_line,
        "-".repeat(header_line.chars().count())
    );
    for row in &rows {
        out.push_str(&line(row));
        out.push('\n');
    }
    out
}

/// Render the CSV summary: a label row per report, then its table or `No data.`,
/// then a blank separator line
pub fn render_summary_csv(results: &RunResults, summaries: &[ReportSummary]) -> Result<String> {
    let mut out = String::new();

    for report_name in results.keys() {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(Vec::new());
        writer.write_record([format!("REPORT: {}", report_name)])?;

        match summaries.iter().find(|s| &s.report_name == report_name) {
            Some(summary) => {
                writer.write_record(summary_header(summary))?;
                for row in &summary.rows {
                    writer.write_record(summary_row(row))?;
                }
            }
            None => writer.write_record(["No data."])?,
        }

        out.push_str(&finish_csv(writer)?);
        out.push('\n');
    }

    Ok(out)
}

fn finish_csv(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to finish CSV: {}", e.error()))?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

/// Render every record as one flat CSV row
pub fn render_detail_csv(results: &RunResults, models: &[ModelId]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header: Vec<String> = ["Report", "Question Number", "Question", "Expected Answer"]
        .iter()
        .map(|h| h.to_string())
        .collect();
    for model in models {
        header.push(format!("{} Response", model));
        header.push(format!("{} Is Correct", model));
        header.push(format!("{} Cost", model));
        header.push(format!("{} Tokens", model));
    }
    writer.write_record(&header)?;

    for (report_name, records) in results {
        for record in records {
            let mut row = vec![
                report_name.clone(),
                record.id.to_string(),
                record.question.clone(),
                record.expected_answer.clone(),
            ];
            for model in models {
                match record.outcome(model) {
                    Some(outcome) => {
                        row.push(outcome.response.clone());
                        row.push(bool_label(outcome.is_correct).to_string());
                        row.push(outcome.cost.to_string());
                        row.push(outcome.tokens.to_string());
                    }
                    None => row.extend(std::iter::repeat_n(String::new(), 4)),
                }
            }
            writer.write_record(&row)?;
        }
    }

    finish_csv(writer)
}

/// Write `content` to `path`, creating parent directories
pub fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write results to: {}", path.display()))?;
    tracing::info!("Results stored to: {}", path.display());
    Ok(())
}

/// Store the full records map as pretty JSON
pub fn write_json_results(results: &RunResults, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(results).context("Failed to serialize results to JSON")?;
    write_file(path, &json)
}
