//! Job descriptors handed to the worker pool and their outcomes

use crate::tools::AlignTool;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum JobKind {
    IndexBuild,
    Alignment,
    ProfileBuild,
    Annotation,
}

impl JobKind {
    pub fn name(&self) -> &'static str {
        match self {
            JobKind::IndexBuild => "index-build",
            JobKind::Alignment => "alignment",
            JobKind::ProfileBuild => "profile-build",
            JobKind::Annotation => "annotation",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Kind-specific arguments that are not plain input/output paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobParams {
    None,
    Database { prefix: PathBuf },
    Aligner(AlignTool),
    Annotator { species_id: String, cpus: usize },
}

/// One invocation of an external tool.
///
/// `output` doubles as the idempotency key: a job is only planned when that
/// file is missing or empty (alignment jobs excepted, they always run).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescriptor {
    pub kind: JobKind,
    /// Species or group identifier the job belongs to
    pub label: String,
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
    pub params: JobParams,
}

impl JobDescriptor {
    pub fn new(kind: JobKind, label: impl Into<String>, inputs: Vec<PathBuf>, output: PathBuf) -> Self {
        Self {
            kind,
            label: label.into(),
            inputs,
            output,
            params: JobParams::None,
        }
    }

    pub fn with_params(mut self, params: JobParams) -> Self {
        self.params = params;
        self
    }

    pub fn primary_input(&self) -> Option<&PathBuf> {
        self.inputs.first()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Succeeded,
    /// The tool ran and exited unsuccessfully
    Failed { code: Option<i32>, stderr: String },
    /// The tool could not be started at all
    NotLaunched(String),
}

#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub job: JobDescriptor,
    pub status: JobStatus,
}

impl JobOutcome {
    pub fn succeeded(job: JobDescriptor) -> Self {
        Self {
            job,
            status: JobStatus::Succeeded,
        }
    }

    pub fn failed(job: JobDescriptor, code: Option<i32>, stderr: impl Into<String>) -> Self {
        Self {
            job,
            status: JobStatus::Failed {
                code,
                stderr: stderr.into(),
            },
        }
    }

    pub fn not_launched(job: JobDescriptor, reason: impl Into<String>) -> Self {
        Self {
            job,
            status: JobStatus::NotLaunched(reason.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == JobStatus::Succeeded
    }
}

/// Per-kind tally of a finished batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub submitted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Jobs not attempted because the stage's tool is unavailable
    pub skipped: usize,
}

impl BatchReport {
    pub fn skipped(submitted: usize) -> Self {
        Self {
            submitted,
            skipped: submitted,
            ..Self::default()
        }
    }

    pub fn from_outcomes(outcomes: &[JobOutcome]) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        Self {
            submitted: outcomes.len(),
            succeeded,
            failed: outcomes.len() - succeeded,
            skipped: 0,
        }
    }
}
