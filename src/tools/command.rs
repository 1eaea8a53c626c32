//! Process-spawning implementations of the tool seams

use crate::core::config::{AlignmentConfig, IndexConfig, PipelineConfig, ToolsConfig};
use crate::pipeline::jobs::{JobDescriptor, JobKind, JobOutcome, JobParams};
use crate::tools::traits::{ToolAvailability, ToolRunner};
use crate::tools::types::{AlignTool, Tool};
use std::fs::File;
use std::path::Path;
use std::process::{Command, Stdio};

// Keep the tail of a failing tool's stderr, it is usually where the reason is.
const STDERR_TAIL: usize = 2000;

pub fn binary_for(tools: &ToolsConfig, tool: Tool) -> &str {
    match tool {
        Tool::MakeBlastDb => &tools.makeblastdb,
        Tool::Mafft => &tools.mafft,
        Tool::Muscle => &tools.muscle,
        Tool::HmmBuild => &tools.hmmbuild,
        Tool::FasAnnotate => &tools.fas_annotate,
    }
}

/// Looks tools up on `PATH` (or checks the configured absolute path)
#[derive(Debug, Clone)]
pub struct PathLookup {
    tools: ToolsConfig,
}

impl PathLookup {
    pub fn new(tools: ToolsConfig) -> Self {
        Self { tools }
    }
}

impl ToolAvailability for PathLookup {
    fn is_available(&self, tool: Tool) -> bool {
        which::which(binary_for(&self.tools, tool)).is_ok()
    }
}

/// A command line ready to spawn, plus the file its stdout goes to, if any
pub struct PreparedCommand {
    pub command: Command,
    pub stdout_to: Option<std::path::PathBuf>,
}

/// Runs each job as a child process of the configured tool
#[derive(Debug, Clone)]
pub struct CommandRunner {
    tools: ToolsConfig,
    index: IndexConfig,
    alignment: AlignmentConfig,
}

impl CommandRunner {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            tools: config.tools.clone(),
            index: config.index.clone(),
            alignment: config.alignment.clone(),
        }
    }

    pub fn prepare(&self, job: &JobDescriptor) -> Result<PreparedCommand, String> {
        let input = job
            .primary_input()
            .ok_or_else(|| format!("{} job for {} has no input", job.kind, job.label))?;

        let prepared = match (job.kind, &job.params) {
            (JobKind::IndexBuild, JobParams::Database { prefix }) => {
                let mut cmd = Command::new(binary_for(&self.tools, Tool::MakeBlastDb));
                cmd.arg("-in")
                    .arg(input)
                    .arg("-dbtype")
                    .arg(&self.index.db_type)
                    .arg("-out")
                    .arg(prefix);
                PreparedCommand { command: cmd, stdout_to: None }
            }
            (JobKind::Alignment, JobParams::Aligner(AlignTool::Mafft)) => {
                let mut cmd = Command::new(binary_for(&self.tools, Tool::Mafft));
                cmd.args(&self.alignment.mafft_args).arg(input);
                PreparedCommand {
                    command: cmd,
                    stdout_to: Some(job.output.clone()),
                }
            }
            (JobKind::Alignment, JobParams::Aligner(AlignTool::Muscle)) => {
                let mut cmd = Command::new(binary_for(&self.tools, Tool::Muscle));
                cmd.arg("-in").arg(input).arg("-out").arg(&job.output);
                PreparedCommand { command: cmd, stdout_to: None }
            }
            (JobKind::ProfileBuild, _) => {
                let mut cmd = Command::new(binary_for(&self.tools, Tool::HmmBuild));
                cmd.arg("--cpu")
                    .arg(self.alignment.hmmbuild_cpus.to_string())
                    .arg(&job.output)
                    .arg(input);
                PreparedCommand { command: cmd, stdout_to: None }
            }
            (JobKind::Annotation, JobParams::Annotator { species_id, cpus }) => {
                let out_dir = job.output.parent().unwrap_or_else(|| Path::new("."));
                let mut cmd = Command::new(binary_for(&self.tools, Tool::FasAnnotate));
                cmd.arg("-i")
                    .arg(input)
                    .arg("-o")
                    .arg(out_dir)
                    .arg("-n")
                    .arg(species_id)
                    .arg("--cpus")
                    .arg(cpus.to_string());
                PreparedCommand { command: cmd, stdout_to: None }
            }
            (kind, params) => {
                return Err(format!("{} job for {} has unexpected parameters {:?}", kind, job.label, params))
            }
        };

        Ok(prepared)
    }
}

impl ToolRunner for CommandRunner {
    fn run(&self, job: &JobDescriptor) -> JobOutcome {
        let PreparedCommand { mut command, stdout_to } = match self.prepare(job) {
            Ok(prepared) => prepared,
            Err(reason) => return JobOutcome::not_launched(job.clone(), reason),
        };

        command.stdin(Stdio::null()).stderr(Stdio::piped());
        match stdout_to {
            Some(path) => match File::create(&path) {
                Ok(file) => {
                    command.stdout(Stdio::from(file));
                }
                Err(e) => {
                    return JobOutcome::not_launched(
                        job.clone(),
                        format!("cannot create {}: {}", path.display(), e),
                    )
                }
            },
            None => {
                command.stdout(Stdio::null());
            }
        }

        tracing::debug!("Running {:?}", command);

        match command.output() {
            Ok(output) if output.status.success() => JobOutcome::succeeded(job.clone()),
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                let start = stderr.len().saturating_sub(STDERR_TAIL);
                let start = (start..stderr.len())
                    .find(|&i| stderr.is_char_boundary(i))
                    .unwrap_or(stderr.len());
                JobOutcome::failed(job.clone(), output.status.code(), stderr[start..].trim())
            }
            Err(e) => JobOutcome::not_launched(job.clone(), e.to_string()),
        }
    }
}
