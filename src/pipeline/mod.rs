//! Extraction and scheduling engine
//!
//! Stages run strictly one after another:
//! species setup, index build, group extraction and planning, alignment,
//! profile build and, when requested, annotation.

pub mod extractor;
pub mod jobs;
pub mod orchestrator;
pub mod planner;
pub mod registry;

pub use extractor::{normalize_group_id, GroupExtractor, GroupRecord, OrthologGroup};
pub use jobs::{BatchReport, JobDescriptor, JobKind, JobOutcome, JobParams, JobStatus};
pub use orchestrator::{Orchestrator, RunOptions, RunSummary, Stage};
pub use planner::{GroupJobs, JobPlanner};
pub use registry::{GeneIndex, NormalizedSpecies, SpeciesRegistry, SpeciesSetup};
