use crate::bio::orthoxml::OrthoXmlDocument;
use crate::bio::taxonomy::TaxonMap;
use crate::core::config::PipelineConfig;
use crate::core::paths::OutputLayout;
use crate::pipeline::extractor::extract;
use crate::pipeline::jobs::{BatchReport, JobDescriptor, JobOutcome, JobStatus};
use crate::pipeline::planner::JobPlanner;
use crate::pipeline::registry::{RegistrySettings, SpeciesRegistry};
use crate::tools::{AlignTool, CommandRunner, PathLookup, Tool, ToolAvailability, ToolRunner};
use crate::utils::parallel::WorkerPool;
use crate::{OrthoprepError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// `YYMM` of today, the default data version
pub fn default_data_version() -> String {
    chrono::Local::now().format("%y%m").to_string()
}

/// Everything a run needs besides the tool configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub in_file: PathBuf,
    pub out_path: PathBuf,
    pub gene_set_dir: PathBuf,
    pub mapping_file: PathBuf,
    pub job_name: String,
    pub data_version: String,
    pub align_tool: AlignTool,
    pub annotate: bool,
    pub max_groups: Option<usize>,
    /// 0 means every species of the mapping file
    pub min_taxa: usize,
    pub cpus: usize,
}

impl RunOptions {
    pub fn new(
        in_file: impl Into<PathBuf>,
        out_path: impl Into<PathBuf>,
        gene_set_dir: impl Into<PathBuf>,
        mapping_file: impl Into<PathBuf>,
        job_name: &str,
    ) -> Self {
        Self {
            in_file: in_file.into(),
            out_path: out_path.into(),
            gene_set_dir: gene_set_dir.into(),
            mapping_file: mapping_file.into(),
            job_name: job_name.to_string(),
            data_version: default_data_version(),
            align_tool: AlignTool::default(),
            annotate: false,
            max_groups: None,
            min_taxa: 0,
            cpus: 4,
        }
    }

    /// Input checks that must pass before any stage starts
    pub fn validate(&self) -> Result<()> {
        if !self.in_file.is_file() {
            return Err(missing("Input OrthoXML file", &self.in_file));
        }
        if !self.gene_set_dir.is_dir() {
            return Err(missing("Gene set directory", &self.gene_set_dir));
        }
        if !self.mapping_file.is_file() {
            return Err(missing("Mapping file", &self.mapping_file));
        }
        if self.job_name.trim().is_empty() {
            return Err(OrthoprepError::Config("Job name must not be empty".to_string()));
        }
        if self.data_version.trim().is_empty() {
            return Err(OrthoprepError::Config("Data version must not be empty".to_string()));
        }
        Ok(())
    }
}

fn missing(what: &'static str, path: &Path) -> OrthoprepError {
    OrthoprepError::MissingInput {
        what,
        path: path.to_path_buf(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    SpeciesSetup,
    IndexBuild,
    GroupExtraction,
    Alignment,
    ProfileBuild,
    Annotation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::SpeciesSetup => "species setup",
            Stage::IndexBuild => "BLAST database build",
            Stage::GroupExtraction => "ortholog group extraction",
            Stage::Alignment => "MSA calculation",
            Stage::ProfileBuild => "pHMM build",
            Stage::Annotation => "FAS annotation",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub species_registered: usize,
    pub species_dropped: Vec<String>,
    pub groups_extracted: usize,
    pub groups_retained: usize,
    /// Group ids seen again after normalization; later occurrences are skipped
    pub duplicate_groups: Vec<String>,
    pub min_taxa: usize,
    pub index: BatchReport,
    pub alignment: BatchReport,
    pub profile: BatchReport,
    /// `None` when annotation was not requested
    pub annotation: Option<BatchReport>,
    pub failed_jobs: Vec<String>,
    pub elapsed_secs: f64,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        !self.failed_jobs.is_empty()
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| OrthoprepError::Parse(format!("Failed to serialize summary: {}", e)))?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Runs the stages in order, each one finishing before the next starts.
pub struct Orchestrator {
    options: RunOptions,
    config: PipelineConfig,
    runner: Box<dyn ToolRunner>,
    availability: Box<dyn ToolAvailability>,
}

impl Orchestrator {
    pub fn new(options: RunOptions, config: PipelineConfig) -> Self {
        let runner = Box::new(CommandRunner::new(&config));
        let availability = Box::new(PathLookup::new(config.tools.clone()));
        Self {
            options,
            config,
            runner,
            availability,
        }
    }

    pub fn with_runner(mut self, runner: impl ToolRunner + 'static) -> Self {
        self.runner = Box::new(runner);
        self
    }

    pub fn with_availability(mut self, availability: impl ToolAvailability + 'static) -> Self {
        self.availability = Box::new(availability);
        self
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    pub fn run(&self) -> Result<RunSummary> {
        let start = Instant::now();
        let options = &self.options;
        options.validate()?;

        let taxa = TaxonMap::load(&options.mapping_file)?;
        let document = OrthoXmlDocument::open(&options.in_file)?;
        let min_taxa = if options.min_taxa == 0 {
            taxa.len()
        } else {
            options.min_taxa
        };

        let layout = OutputLayout::new(&options.out_path, &options.job_name);
        layout.create_skeleton()?;
        let pool = WorkerPool::new(options.cpus)?.with_progress(self.config.progress.show_bars);

        let mut summary = RunSummary {
            min_taxa,
            ..RunSummary::default()
        };

        info!("Stage: {}", Stage::SpeciesSetup);
        let mut registry = SpeciesRegistry::new(
            taxa,
            layout,
            RegistrySettings {
                version: options.data_version.clone(),
                gene_set_dir: options.gene_set_dir.clone(),
                index_extension: self.config.index.extension.clone(),
                annotation_cpus: pool.size(),
            },
        );
        let mut index_jobs = Vec::new();
        let mut annotation_jobs = Vec::new();
        for declaration in document.species()? {
            if let Some(setup) = registry.register(&declaration)? {
                index_jobs.extend(setup.index_job);
                annotation_jobs.extend(setup.annotation_job);
            }
        }
        let registry = registry;
        summary.species_registered = registry.len();
        summary.species_dropped = registry.dropped().to_vec();
        info!(
            "Registered {} species ({} not in mapping file)",
            summary.species_registered,
            summary.species_dropped.len()
        );

        summary.index = self.run_batch(
            Stage::IndexBuild,
            Tool::MakeBlastDb,
            index_jobs,
            &mut summary.failed_jobs,
            |jobs| pool.run_all(self.runner.as_ref(), jobs),
        );

        info!("Stage: {}", Stage::GroupExtraction);
        let planner = JobPlanner::new(registry.layout(), min_taxa, options.align_tool);
        let mut alignment_jobs = Vec::new();
        let mut profile_jobs = Vec::new();
        let mut group_ids = HashSet::new();
        for group in extract(&document, &registry, options.max_groups)? {
            let group = group?;
            summary.groups_extracted += 1;
            if !group_ids.insert(group.id.clone()) {
                warn!("Ortholog group {} occurs more than once, keeping the first", group.id);
                summary.duplicate_groups.push(group.id);
                continue;
            }
            if let Some(planned) = planner.plan(&group)? {
                summary.groups_retained += 1;
                alignment_jobs.push(planned.alignment);
                profile_jobs.extend(planned.profile);
            }
        }
        info!(
            "Retained {} of {} ortholog groups (min taxa {})",
            summary.groups_retained, summary.groups_extracted, min_taxa
        );

        summary.alignment = self.run_batch(
            Stage::Alignment,
            options.align_tool.tool(),
            alignment_jobs,
            &mut summary.failed_jobs,
            |jobs| pool.run_streaming(self.runner.as_ref(), jobs, "Calculating MSAs"),
        );

        summary.profile = self.run_batch(
            Stage::ProfileBuild,
            Tool::HmmBuild,
            profile_jobs,
            &mut summary.failed_jobs,
            |jobs| pool.run_streaming(self.runner.as_ref(), jobs, "Building pHMMs"),
        );

        if options.annotate {
            summary.annotation = Some(self.run_batch(
                Stage::Annotation,
                Tool::FasAnnotate,
                annotation_jobs,
                &mut summary.failed_jobs,
                |jobs| jobs.iter().map(|job| self.runner.run(job)).collect(),
            ));
        }

        summary.elapsed_secs = start.elapsed().as_secs_f64();
        info!("Finished in {:.3}s", summary.elapsed_secs);
        Ok(summary)
    }

    fn run_batch<F>(
        &self,
        stage: Stage,
        tool: Tool,
        jobs: Vec<JobDescriptor>,
        failures: &mut Vec<String>,
        execute: F,
    ) -> BatchReport
    where
        F: FnOnce(Vec<JobDescriptor>) -> Vec<JobOutcome>,
    {
        if jobs.is_empty() {
            info!("Stage: {} (nothing to do)", stage);
            return BatchReport::default();
        }
        if !self.availability.is_available(tool) {
            warn!(
                "{} not found, skipping {} for {} jobs",
                tool.name(),
                stage,
                jobs.len()
            );
            return BatchReport::skipped(jobs.len());
        }

        info!("Stage: {} ({} jobs)", stage, jobs.len());
        let outcomes = execute(jobs);
        for outcome in outcomes.iter().filter(|o| !o.is_success()) {
            let reason = match &outcome.status {
                JobStatus::Failed { code, stderr } => match code {
                    Some(code) => format!("exit code {}: {}", code, stderr),
                    None => format!("terminated by signal: {}", stderr),
                },
                JobStatus::NotLaunched(reason) => format!("not launched: {}", reason),
                JobStatus::Succeeded => continue,
            };
            warn!("{} failed for {}: {}", outcome.job.kind, outcome.job.label, reason);
            failures.push(format!("{} {}: {}", outcome.job.kind, outcome.job.label, reason));
        }
        BatchReport::from_outcomes(&outcomes)
    }
}
