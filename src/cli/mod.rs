use crate::core::config::{default_config, load_config, PipelineConfig};
use crate::pipeline::orchestrator::{default_data_version, RunOptions};
use crate::tools::AlignTool;
use crate::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "orthoprep",
    version,
    about = "Prepare core ortholog groups from an OrthoXML file",
    long_about = "Orthoprep extracts ortholog groups from an OrthoXML document, writes one FASTA \
                  file per group and drives makeblastdb, MAFFT/MUSCLE, hmmbuild and optionally \
                  FAS annotation over the results. Existing outputs are reused on rerun."
)]
pub struct Cli {
    /// Input OrthoXML file
    #[arg(short = 'i', long)]
    pub in_file: PathBuf,

    /// Output directory
    #[arg(short = 'o', long)]
    pub out_path: PathBuf,

    /// Directory holding one gene set per species
    #[arg(short = 'g', long)]
    pub gene_set: PathBuf,

    /// Tab-separated species mapping file (taxon id, name, abbreviation)
    #[arg(short = 'm', long)]
    pub mapping_file: PathBuf,

    /// Job name, the core groups land in <out-path>/core_orthologs/<job-name>
    #[arg(short = 'j', long)]
    pub job_name: String,

    /// Data version appended to species identifiers (default: current YYMM)
    #[arg(short = 'v', long)]
    pub data_version: Option<String>,

    /// Alignment tool: mafft or muscle
    #[arg(short = 'a', long, default_value = "mafft")]
    pub align_tool: AlignTool,

    /// Annotate gene sets with FAS
    #[arg(short = 'f', long)]
    pub anno_fas: bool,

    /// Stop after this many ortholog groups
    #[arg(short = 'l', long)]
    pub max_groups: Option<usize>,

    /// Minimum number of taxa per group (0 = all species of the mapping file)
    #[arg(short = 't', long, default_value = "0")]
    pub min_taxa: usize,

    /// Number of parallel jobs
    #[arg(short = 'c', long, default_value = "4")]
    pub cpus: usize,

    /// TOML configuration file for tool names and defaults
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write a JSON run summary to this path
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Hide progress bars
    #[arg(long)]
    pub no_progress: bool,
}

impl Cli {
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            in_file: self.in_file.clone(),
            out_path: self.out_path.clone(),
            gene_set_dir: self.gene_set.clone(),
            mapping_file: self.mapping_file.clone(),
            job_name: self.job_name.clone(),
            data_version: self.data_version.clone().unwrap_or_else(default_data_version),
            align_tool: self.align_tool,
            annotate: self.anno_fas,
            max_groups: self.max_groups,
            min_taxa: self.min_taxa,
            cpus: self.cpus,
        }
    }

    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => default_config(),
        };
        if self.no_progress {
            config.progress.show_bars = false;
        }
        Ok(config)
    }
}
