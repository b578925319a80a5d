// Coverage Effect - CLI entry point
// Reads both tables, runs the per-entity pipeline, writes the artifacts

use anyhow::{bail, Context, Result};
use chrono::Utc;
use std::env;
use std::path::PathBuf;

use coverage_effect::{
    fingerprint_file, ChartArtifact, EffectEstimator, LinearEffectEstimator, PipelineRunner,
    ProvenanceLog, ResultsArtifact, RunConfig, RunHeader, TableReader,
};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let config = parse_args(&args)?;
    run_analysis(config)
}

fn print_usage() {
    println!("coverage-effect {}", coverage_effect::VERSION);
    println!();
    println!("Usage:");
    println!("  coverage-effect [run] [--config <file>] [<treatment.csv> <outcome.csv> [<out_dir>]]");
    println!();
    println!("  --config <file>   JSON run configuration (missing fields take defaults)");
    println!("  positional paths  override the configured input files and output directory");
}

fn parse_args(args: &[String]) -> Result<RunConfig> {
    let mut config: Option<RunConfig> = None;
    let mut positional: Vec<PathBuf> = Vec::new();

    let mut iter = args.iter().peekable();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            // Default (and only) mode
            "run" => {}
            "--config" => {
                let path = iter
                    .next()
                    .context("--config requires a file path argument")?;
                config = Some(RunConfig::load(std::path::Path::new(path))?);
            }
            flag if flag.starts_with('-') => bail!("Unknown option '{}'", flag),
            path => positional.push(PathBuf::from(path)),
        }
    }

    let mut config = config.unwrap_or_default();
    match positional.len() {
        0 => {}
        2 | 3 => {
            config.treatment_path = positional[0].clone();
            config.outcome_path = positional[1].clone();
            if let Some(dir) = positional.get(2) {
                config.output_dir = dir.clone();
            }
        }
        n => bail!(
            "Expected 0, 2 or 3 positional paths (treatment, outcome, [out_dir]), got {}",
            n
        ),
    }
    config.validate()?;
    Ok(config)
}

fn run_analysis(config: RunConfig) -> Result<()> {
    println!("📊 Coverage Effect - vaccination coverage → reported cases");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // 1. Read and clean both input tables
    let reader = TableReader::from_config(&config)?;

    println!("\n📂 Reading treatment table...");
    let (treatment, treatment_clean) = reader.read_table(&config.treatment_path)?;
    println!("✓ {}", treatment_clean.summary());

    println!("\n📂 Reading outcome table...");
    let (outcome, outcome_clean) = reader.read_table(&config.outcome_path)?;
    println!("✓ {}", outcome_clean.summary());

    for stats in [&treatment_clean, &outcome_clean] {
        if stats.has_collisions() {
            eprintln!(
                "⚠️  {}: {} entity name(s) collided after normalization (last row kept)",
                stats.source_file, stats.key_collisions
            );
        }
    }

    // 2. Open the provenance log with input fingerprints
    println!("\n📝 Opening provenance log...");
    let estimator = LinearEffectEstimator::new();
    let header = RunHeader::new(
        estimator.name(),
        vec![
            fingerprint_file(&config.treatment_path)?,
            fingerprint_file(&config.outcome_path)?,
        ],
    );
    let mut log = ProvenanceLog::create(&config.provenance_path(), &header)?;
    println!("✓ {}", log.path().display());

    // 3. Align and estimate per entity
    println!("\n🔬 Estimating causal effects...\n");
    let runner = PipelineRunner::new(&estimator);
    let (results, summary) = runner.run(&treatment, &outcome, &mut log)?;
    log.finish()?;

    // 4. Write artifacts
    println!("\n💾 Writing artifacts...");
    let chart = ChartArtifact::from_results(&results, &config);
    chart.write_json(&config.chart_json_path())?;
    chart.write_html(&config.chart_html_path())?;
    println!("✓ {}", config.chart_html_path().display());

    let artifact = ResultsArtifact {
        run_id: header.run_id,
        generated_at: Utc::now(),
        summary: summary.clone(),
        treatment_clean,
        outcome_clean,
        results,
    };
    std::fs::write(
        config.results_path(),
        serde_json::to_string_pretty(&artifact)?,
    )
    .with_context(|| format!("Failed to write results {:?}", config.results_path()))?;
    println!("✓ {}", config.results_path().display());

    // 5. Summary
    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✅ {}", summary.summary());
    if summary.recorded == 0 {
        println!("   No entity had a usable window; the chart is empty.");
    }
    println!("   Provenance: {}", config.provenance_path().display());

    Ok(())
}
