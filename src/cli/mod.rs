//! Star type CLI Module
//!
//! Command-line interface for running model comparisons and the HTTP server.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::comparison::{ComparisonConfig, FitVerdict, ModelComparisonEngine, Report};
use crate::data::Dataset;

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn line_box_top()    { println!("  {}", dim("┌─────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└─────────────────────────────────────────────────────────┘")); }
fn line_box_sep()    { println!("  {}", dim("├─────────────────────────────────────────────────────────┤")); }

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn line_box_center(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let total_pad = W.saturating_sub(visible_len);
    let left = total_pad / 2;
    let right = total_pad - left;
    println!("  {}  {}{}{} {}", dim("│"), " ".repeat(left), content, " ".repeat(right), dim("│"));
}

fn line_box_empty() { line_box(""); }

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "startype")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Compare logistic regression strategies for star type classification")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the four-strategy comparison on a CSV file
    Compare {
        /// Input CSV file, label in the last column
        #[arg(short, long)]
        data: PathBuf,

        /// Write the report as CSV to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of cross-validation folds
        #[arg(long, default_value = "10")]
        cv_folds: usize,

        /// Accuracy gap that counts as over- or underfitting
        #[arg(long, default_value = "0.5")]
        threshold: f64,

        /// Run the grid search on a single thread
        #[arg(long)]
        sequential: bool,
    },

    /// Show dataset information
    Info {
        /// Input CSV file
        #[arg(short, long)]
        data: PathBuf,
    },

    /// Start the web server
    Serve {
        /// Server port (defaults to API_PORT or 8080)
        #[arg(short, long)]
        port: Option<u16>,

        /// Server host (defaults to API_HOST or 0.0.0.0)
        #[arg(long)]
        host: Option<String>,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_compare(
    data_path: &Path,
    output: Option<&Path>,
    cv_folds: usize,
    threshold: f64,
    sequential: bool,
) -> anyhow::Result<()> {
    section("Compare");

    step_run("Loading data");
    let start = Instant::now();
    let dataset = Dataset::from_csv_path(data_path)?;
    step_done(&format!(
        "{} rows × {} features, {} classes in {:?}",
        dataset.n_samples(),
        dataset.n_features(),
        dataset.n_classes(),
        start.elapsed()
    ));

    let mut config = ComparisonConfig::default()
        .with_cv_folds(cv_folds)
        .with_fit_threshold(threshold);
    if sequential {
        config.search.n_jobs = 1;
    }

    step_run(&format!("Evaluating {} grid candidates", config.search.n_candidates()));
    let start = Instant::now();
    let report = ModelComparisonEngine::new(config).compare(&dataset)?;
    step_done(&format!("{:?}", start.elapsed()));

    print_report(&report);

    if let Some(path) = output {
        step_run(&format!("Saving → {}", path.display()));
        std::fs::write(path, report.to_csv()?)?;
        step_done("");
    }

    println!();
    Ok(())
}

fn print_report(report: &Report) {
    println!();
    println!(
        "  {:<24} {:>10} {:>10}  {}",
        muted("Changes made"),
        muted("Training"),
        muted("Holdout"),
        muted("Fitting")
    );
    println!("  {}", dim(&"─".repeat(60)));

    for row in report.rows() {
        let verdict = match row.fit_verdict {
            FitVerdict::GoodFit => ok(row.fit_verdict.as_str()),
            _ => row.fit_verdict.as_str().yellow(),
        };
        println!(
            "  {:<24} {:>10.4} {:>10.4}  {}",
            row.name(),
            row.training_score,
            row.holdout_score,
            verdict
        );
    }

    println!("  {}", dim(&"─".repeat(60)));
    println!("  {:<16} {} / {}", muted("Train / holdout"), report.n_train, report.n_holdout);
    if let Some(best) = &report.tuned_params {
        println!("  {:<16} {}", muted("Tuned params"), best.to_string().white());
    }
}

pub fn cmd_info(data_path: &Path) -> anyhow::Result<()> {
    section("Data Info");

    let dataset = Dataset::from_csv_path(data_path)?;

    println!("  {:<12} {}", muted("File"), data_path.display());
    println!("  {:<12} {}", muted("Rows"), dataset.n_samples());
    println!("  {:<12} {}", muted("Features"), dataset.feature_names().join(", "));
    println!("  {:<12} {}", muted("Label"), dataset.label_name());
    println!();

    println!("  {:<20} {:>8}", muted("Class"), muted("Rows"));
    println!("  {}", dim(&"─".repeat(30)));
    for (idx, class) in dataset.classes().iter().enumerate() {
        let count = dataset.labels().iter().filter(|&&l| l == idx).count();
        println!("  {:<20} {:>8}", class, count);
    }

    println!();
    Ok(())
}

// ─── Serve ─────────────────────────────────────────────────────────────────────

pub async fn cmd_serve(host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    use crate::server::{run_server, ServerConfig};

    let mut config = ServerConfig::default();
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }

    println!();
    line_box_top();
    line_box_empty();
    line_box_center(&format!("{}", "Star Type Comparison".white().bold()));
    line_box_center(&format!("{}", dim(&format!("v{}", env!("CARGO_PKG_VERSION")))));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box(&kv("Predict", &format!("http://{}:{}/predict", config.host, config.port)));
    line_box(&kv("Health ", &format!("http://{}:{}/health", config.host, config.port)));
    line_box(&kv("CORS   ", &config.cors_origin));
    line_box_empty();
    line_box_bottom();
    println!();

    run_server(config, ComparisonConfig::default()).await
}
