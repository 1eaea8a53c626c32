use clap::Parser;
use colored::*;
use orthoprep::cli::Cli;
use orthoprep::{Orchestrator, OrthoprepError, RunSummary};
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    // ORTHOPREP_LOG wins over RUST_LOG
    let filter = std::env::var("ORTHOPREP_LOG")
        .ok()
        .and_then(|level| EnvFilter::try_new(level).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);

        let exit_code = match e.downcast_ref::<OrthoprepError>() {
            Some(OrthoprepError::Config(_)) | Some(OrthoprepError::MissingInput { .. }) => 2,
            Some(OrthoprepError::Io(_)) => 3,
            Some(OrthoprepError::Parse(_))
            | Some(OrthoprepError::Xml(_))
            | Some(OrthoprepError::MalformedMappingRow { .. }) => 4,
            Some(OrthoprepError::AmbiguousOrMissingGeneSet { .. })
            | Some(OrthoprepError::DuplicateProtein { .. }) => 5,
            _ => 1,
        };
        process::exit(exit_code);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.pipeline_config()?;
    let options = cli.run_options();
    let core_dir = options.out_path.join("core_orthologs").join(&options.job_name);

    let summary = Orchestrator::new(options, config).run()?;

    if let Some(path) = &cli.summary {
        summary.write_json(path)?;
    }
    print_summary(&summary);
    println!("Core set saved at {}", core_dir.display().to_string().cyan());
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("{}", "Summary".bold());
    println!(
        "  Species:    {} registered, {} dropped",
        summary.species_registered,
        summary.species_dropped.len()
    );
    println!(
        "  Groups:     {} retained of {} (min taxa {})",
        summary.groups_retained, summary.groups_extracted, summary.min_taxa
    );
    if !summary.duplicate_groups.is_empty() {
        println!(
            "{} {} duplicate group id(s) skipped",
            "Warning:".yellow().bold(),
            summary.duplicate_groups.len()
        );
    }

    let mut stages = vec![
        ("Databases", &summary.index),
        ("MSAs", &summary.alignment),
        ("pHMMs", &summary.profile),
    ];
    if let Some(annotation) = &summary.annotation {
        stages.push(("Annotation", annotation));
    }
    for (name, report) in stages {
        let line = format!(
            "  {:<11} {} ok, {} failed, {} skipped",
            format!("{}:", name),
            report.succeeded,
            report.failed,
            report.skipped
        );
        if report.failed > 0 {
            println!("{}", line.yellow());
        } else {
            println!("{}", line);
        }
    }

    if summary.has_failures() {
        println!(
            "{} {} job(s) failed, see the log for details",
            "Warning:".yellow().bold(),
            summary.failed_jobs.len()
        );
    } else {
        println!("{} in {:.1}s", "Finished".green().bold(), summary.elapsed_secs);
    }
}
