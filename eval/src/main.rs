// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Fairness benchmark CLI
//!
//! Usage:
//!   fairbench --datasets synthetic --num-trials 5
//!   fairbench --datasets adult,german --data-dir ./data/preprocessed --output results
//!   fairbench --param LogisticRegression.epochs=500 --isolate-failures

use anyhow::{Context, Result};
use clap::Parser;
use fairbench::datasets::{SplitConfig, DEFAULT_TRAIN_FRACTION};
use fairbench::pipeline::{BenchmarkConfig, BenchmarkPipeline, NUM_TRIALS_DEFAULT};
use fairbench::registry::Registry;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fairbench")]
#[command(about = "Benchmark fairness-aware classification algorithms")]
#[command(version)]
struct Args {
    /// Number of randomized train/test trials per dataset
    #[arg(short, long, default_value_t = NUM_TRIALS_DEFAULT)]
    num_trials: usize,

    /// Datasets to evaluate (comma-separated, empty = all)
    #[arg(short, long)]
    datasets: Option<String>,

    /// Base random seed for splits and stochastic algorithms
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Fraction of rows used for training in every trial
    #[arg(long, default_value_t = DEFAULT_TRAIN_FRACTION)]
    train_fraction: f64,

    /// Directory holding <dataset>_processed.csv files
    #[arg(long, default_value = "data/preprocessed")]
    data_dir: PathBuf,

    /// Algorithm hyperparameter as <algorithm>.<key>=<value> (repeatable)
    #[arg(short, long = "param")]
    params: Vec<String>,

    /// Record failing trials instead of aborting the run
    #[arg(long)]
    isolate_failures: bool,

    /// Output directory for saved results (printed only when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format (json, markdown, both)
    #[arg(short, long, default_value = "both")]
    format: String,

    /// List registered datasets, algorithms and metrics, then exit
    #[arg(long)]
    list: bool,
}

fn print_registry(registry: &Registry) {
    println!("Datasets:");
    for dataset in registry.datasets() {
        println!(
            "  {:<24} class={} sensitive={}",
            dataset.name(),
            dataset.class_attribute(),
            dataset.sensitive_attributes().join(",")
        );
    }

    println!("Algorithms:");
    for algorithm in registry.algorithms() {
        let shape = if algorithm.requires_numerical_only() { " [numerical only]" } else { "" };
        let aware = if algorithm.is_fairness_aware() { " [fairness-aware]" } else { "" };
        println!("  {:<24} {}{}{}", algorithm.name(), algorithm.description(), shape, aware);
    }

    println!("Metrics:");
    for metric in registry.metrics() {
        println!("  {}", metric.name());
    }
    for metric in registry.fairness_metrics() {
        println!("  {} (per sensitive attribute)", metric.name());
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let registry = Registry::standard(args.seed).context("Failed to build registry")?;

    if args.list {
        print_registry(&registry);
        return Ok(());
    }

    let dataset_names: Vec<String> = args
        .datasets
        .map(|d| d.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    let mut config = BenchmarkConfig {
        num_trials: args.num_trials,
        dataset_names,
        split: SplitConfig {
            seed: args.seed,
            train_fraction: args.train_fraction,
        },
        data_dir: args.data_dir,
        isolate_failures: args.isolate_failures,
        ..BenchmarkConfig::default()
    };
    for param in &args.params {
        config.set_param(param)?;
    }

    tracing::info!("Fairness Benchmark");
    tracing::info!("==================");
    tracing::info!("Trials: {}", config.num_trials);
    tracing::info!("Seed: {}", config.split.seed);
    tracing::info!("Data: {}", config.data_dir.display());
    tracing::warn!("Be sure the preprocessed datasets exist before running the benchmark");

    let progress = ProgressBar::new(0).with_style(
        ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} {msg}")?.progress_chars("=> "),
    );
    let pipeline = BenchmarkPipeline::new(config, &registry).with_progress(progress);
    let report = pipeline.run().context("Benchmark failed")?;

    print!("{}", report.format());

    let Some(output) = args.output else {
        return Ok(());
    };

    std::fs::create_dir_all(&output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");

    if args.format == "json" || args.format == "both" {
        let json_path = output.join(format!("benchmark_{}.json", timestamp));
        BenchmarkPipeline::save_results(&report, &json_path)?;
        println!("\nJSON results saved to: {}", json_path.display());
    }

    if args.format == "markdown" || args.format == "both" {
        let markdown = BenchmarkPipeline::generate_report(&report);
        let md_path = output.join(format!("benchmark_{}.md", timestamp));
        std::fs::write(&md_path, markdown)?;
        println!("Markdown report saved to: {}", md_path.display());
    }

    Ok(())
}
