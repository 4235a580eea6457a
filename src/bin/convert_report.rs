//! Flight log report converter
//!
//! Fills the report template from one or more flight log exports without
//! going through the upload service.
//!
//! Usage:
//!   `cargo run --bin convert_report -- march.csv april.xlsx --template "FORMATTED TEMPLATE.xlsx"`
//!
//! Each input `<name>.<ext>` produces `<name>_formatted.xlsx` next to it unless
//! `--output` is given (single input only).

use anyhow::{Context, bail};
use clap::{Arg, ArgAction, Command};
use console::style;
use flightlog_report::config::Config;
use flightlog_report::services::processing::layout::Layout;
use flightlog_report::services::report_service::{
    ConversionSummary, ReportConverter, output_path_for,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
struct FileOutcome {
    input: PathBuf,
    output: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConversionSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn command() -> Command {
    Command::new("Flight log report converter")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Converts flight log exports (CSV, XLSX, XLS, ODS) into the formatted report workbook")
        .arg(
            Arg::new("inputs")
                .value_name("INPUT")
                .help("Flight log exports to convert")
                .num_args(1..)
                .required(true)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("template")
                .short('t')
                .long("template")
                .value_name("PATH")
                .help("Template workbook (defaults to TEMPLATE_PATH)")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("sheet")
                .short('s')
                .long("sheet")
                .value_name("NAME")
                .help("Worksheet to fill (defaults to TEMPLATE_SHEET or the active sheet)"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("PATH")
                .help("Output workbook; only valid with a single input")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print conversion summaries as JSON")
                .action(ArgAction::SetTrue),
        )
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let matches = command().get_matches();
    let config = Config::from_env();

    let inputs: Vec<PathBuf> = matches
        .get_many::<PathBuf>("inputs")
        .context("no input files given")?
        .cloned()
        .collect();
    let template = matches
        .get_one::<PathBuf>("template")
        .cloned()
        .unwrap_or_else(|| config.template_path.clone());
    let sheet = matches
        .get_one::<String>("sheet")
        .cloned()
        .or_else(|| config.template_sheet.clone());
    let output = matches.get_one::<PathBuf>("output").cloned();
    let json = matches.get_flag("json");

    if output.is_some() && inputs.len() > 1 {
        bail!("--output can only be used with a single input");
    }

    let converter = ReportConverter::new(Layout::default(), template, sheet);
    if !converter.template_available() {
        bail!(
            "Template not found: {}",
            converter.template_path().display()
        );
    }

    if !json {
        println!("{}", style("Flight log report converter").bold());
        println!("{}", style("-".repeat(40)).dim());
        println!(
            "Template: {}",
            style(converter.template_path().display()).cyan()
        );
    }

    let pb = ProgressBar::new(inputs.len() as u64);
    if json {
        pb.set_draw_target(indicatif::ProgressDrawTarget::hidden());
    }
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>7}/{len:7} {msg}")
            .unwrap()
            .progress_chars("##-"),
    );

    let mut outcomes = Vec::with_capacity(inputs.len());
    for input in inputs {
        pb.set_message(input.display().to_string());
        let destination = output.clone().unwrap_or_else(|| output_path_for(&input));
        let outcome = match converter.convert(&input, &destination) {
            Ok(summary) => FileOutcome {
                input,
                output: destination,
                summary: Some(summary),
                error: None,
            },
            Err(e) => FileOutcome {
                input,
                output: destination,
                summary: None,
                error: Some(e.to_string()),
            },
        };
        outcomes.push(outcome);
        pb.inc(1);
    }
    pb.finish_and_clear();

    let failures = outcomes.iter().filter(|o| o.error.is_some()).count();

    if json {
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
    } else {
        for outcome in &outcomes {
            report(outcome);
        }
    }

    if failures > 0 {
        bail!("{failures} of {} conversions failed", outcomes.len());
    }
    Ok(())
}

fn report(outcome: &FileOutcome) {
    match (&outcome.summary, &outcome.error) {
        (Some(summary), _) => {
            println!(
                "{} {} -> {}",
                style("OK").green(),
                outcome.input.display(),
                style(outcome.output.display()).cyan()
            );
            println!(
                "   {} rows written, totals on row {}, {} ms",
                summary.rows_written, summary.total_row, summary.processing_time_ms
            );
            if summary.records_dropped > 0 {
                println!(
                    "   {} {} records did not fit the template ({} rows)",
                    style("warning:").yellow(),
                    summary.records_dropped,
                    summary.capacity
                );
            }
        }
        (None, Some(error)) => {
            println!(
                "{} {}: {}",
                style("FAILED").red(),
                outcome.input.display(),
                error
            );
        }
        (None, None) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_accepts_multiple_inputs() {
        let matches = command()
            .try_get_matches_from(["convert_report", "a.csv", "b.xlsx", "--json"])
            .unwrap();
        let inputs: Vec<&PathBuf> = matches.get_many::<PathBuf>("inputs").unwrap().collect();
        assert_eq!(inputs, [&PathBuf::from("a.csv"), &PathBuf::from("b.xlsx")]);
        assert!(matches.get_flag("json"));
    }

    #[test]
    fn test_command_requires_an_input() {
        assert!(command().try_get_matches_from(["convert_report"]).is_err());
    }

    #[test]
    fn test_outcome_serializes_without_empty_fields() {
        let outcome = FileOutcome {
            input: PathBuf::from("bad.csv"),
            output: PathBuf::from("bad_formatted.xlsx"),
            summary: None,
            error: Some("Missing columns: ['date']".to_string()),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert!(json.get("summary").is_none());
        assert_eq!(json["error"], "Missing columns: ['date']");
    }
}
