use super::index::CommitIndex;
use super::magnitude::{hex, MagnitudeModel, Normalization};
use crate::error::{HeatmapError, Result};
use crate::model::{DirectoryRow, HeatmapCell, HeatmapReport, SCHEMA_VERSION};
use crate::period::PeriodKey;
use chrono::Utc;
use console::style;
use html_escape::{encode_double_quoted_attribute, encode_text};
use log::info;
use std::fmt::Write as _;
use std::path::Path;

pub const DEFAULT_TEMPLATE: &str = include_str!("template.html");

const HEATMAP_PLACEHOLDER: &str = "{{heatmap}}";

/// Materialize the full directory × period table, one cell per period.
pub fn build_report(index: &CommitIndex, model: &MagnitudeModel, title: &str) -> HeatmapReport {
    let policy = index.policy();
    let periods: Vec<PeriodKey> = index.each_period().collect();
    let global = model.index_maximum(index);

    let directories = index
        .each_directory()
        .map(|(key, aggregate)| {
            let reference = match model.normalization() {
                Normalization::Global => global,
                Normalization::Directory => model.directory_maximum(aggregate),
            };
            let cells = periods
                .iter()
                .map(|period| {
                    let stats = aggregate.get(period).copied().unwrap_or_default();
                    let magnitude = model.cell_value(&stats);
                    let intensity = model.intensity(magnitude, reference);
                    HeatmapCell {
                        period: *period,
                        commits: stats.commits,
                        additions: stats.additions,
                        deletions: stats.deletions,
                        churn: stats.churn,
                        files_changed: stats.files_changed,
                        magnitude,
                        intensity,
                        color: hex(model.color(intensity)),
                    }
                })
                .collect();
            DirectoryRow {
                path: key.path(),
                segments: key.segments().to_vec(),
                total_commits: aggregate.size(),
                maximum: aggregate.maximum(),
                cells,
            }
        })
        .collect();

    HeatmapReport {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        title: title.to_string(),
        period: policy,
        depth: index.classifier().depth(),
        scale: model.scale(),
        commits: index.commit_count(),
        authors: index.authors().iter().cloned().collect(),
        earliest: index.earliest(),
        latest: index.latest(),
        maximum: index.maximum(),
        periods,
        directories,
    }
}

pub fn load_template(path: Option<&Path>) -> Result<String> {
    let template = match path {
        Some(path) => std::fs::read_to_string(path)?,
        None => return Ok(DEFAULT_TEMPLATE.to_string()),
    };
    if !template.contains(HEATMAP_PLACEHOLDER) {
        return Err(HeatmapError::Template(format!(
            "template has no {HEATMAP_PLACEHOLDER} placeholder"
        )));
    }
    Ok(template)
}

/// Fills every placeholder in one left-to-right pass, so text coming from
/// the report is never scanned for placeholders itself.
pub fn render_html(report: &HeatmapReport, template: &str) -> String {
    let mut html = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        html.push_str(&rest[..start]);
        let tail = &rest[start..];
        let Some(end) = tail.find("}}") else {
            rest = tail;
            break;
        };
        let placeholder = &tail[..end + 2];
        match placeholder {
            "{{title}}" => html.push_str(&encode_text(&report.title)),
            "{{period}}" => html.push_str(report.period.name()),
            "{{summary}}" => html.push_str(&render_summary(report)),
            HEATMAP_PLACEHOLDER => html.push_str(&render_table(report)),
            other => html.push_str(other),
        }
        rest = &tail[end + 2..];
    }
    html.push_str(rest);
    html
}

fn render_summary(report: &HeatmapReport) -> String {
    let mut html = String::from("<dl>");
    let range = match (report.earliest, report.latest) {
        (Some(first), Some(last)) => format!(
            "{} to {}",
            first.format("%Y-%m-%d"),
            last.format("%Y-%m-%d")
        ),
        _ => "no commits".to_string(),
    };
    let rows = [
        ("Commits", report.commits.to_string()),
        ("Authors", report.authors.len().to_string()),
        ("Directories", report.directories.len().to_string()),
        ("Range", range),
        ("Peak churn", report.maximum.to_string()),
    ];
    for (label, value) in rows {
        let _ = write!(html, "<dt>{label}</dt><dd>{}</dd>", encode_text(&value));
    }
    html.push_str("</dl>");
    html
}

fn render_table(report: &HeatmapReport) -> String {
    let mut html = String::from("<table class=\"heatmap\"><thead><tr><th></th>");
    for period in &report.periods {
        let _ = write!(html, "<th>{}</th>", encode_text(&period.label(report.period)));
    }
    html.push_str("</tr></thead><tbody>");

    for row in &report.directories {
        let _ = write!(html, "<tr><th>{}</th>", encode_text(&row.path));
        for cell in &row.cells {
            let tooltip = format!(
                "{}: {} commits, +{}/-{} in {} files",
                cell.period.label(report.period),
                cell.commits,
                cell.additions,
                cell.deletions,
                cell.files_changed
            );
            let _ = write!(
                html,
                "<td style=\"background-color: {}\" title=\"{}\"></td>",
                cell.color,
                encode_double_quoted_attribute(&tooltip)
            );
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    html
}

pub fn write_html(report: &HeatmapReport, template: &str, path: &Path) -> Result<()> {
    std::fs::write(path, render_html(report, template))?;
    info!("Wrote {}", path.display());
    Ok(())
}

pub fn output_json(report: &HeatmapReport) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

pub fn output_summary(report: &HeatmapReport, path: &Path) {
    eprintln!("{}", style("Heatmap Summary").bold());
    eprintln!("{}", "─".repeat(50));
    eprintln!("Repositories: {}", style(&report.title).cyan());
    eprintln!("Commits: {}", style(report.commits).cyan());
    eprintln!("Authors: {}", style(report.authors.len()).yellow());
    eprintln!(
        "Directories: {} × {} {}",
        style(report.directories.len()).cyan(),
        style(report.periods.len()).cyan(),
        report.period.name().to_lowercase()
    );
    if let (Some(first), Some(last)) = (report.earliest, report.latest) {
        eprintln!(
            "Date range: {} to {}",
            style(first.format("%Y-%m-%d")).dim(),
            style(last.format("%Y-%m-%d")).dim()
        );
    }
    eprintln!("Output: {}", style(path.display()).green());
}
