/// Seams between the pipeline and the external programs it drives
///
/// The orchestrator never spawns processes itself; it asks a
/// `ToolAvailability` whether a stage can run and hands each job to a
/// `ToolRunner`. Tests substitute both.
use crate::pipeline::jobs::{JobDescriptor, JobOutcome};
use crate::tools::types::Tool;

/// Executes a single job and reports how it went.
///
/// Implementations must not panic on tool failure: a non-zero exit or a
/// launch error is reported through the returned `JobOutcome`.
pub trait ToolRunner: Send + Sync {
    fn run(&self, job: &JobDescriptor) -> JobOutcome;
}

/// Capability check for an external tool
pub trait ToolAvailability: Send + Sync {
    fn is_available(&self, tool: Tool) -> bool;
}

impl<F> ToolAvailability for F
where
    F: Fn(Tool) -> bool + Send + Sync,
{
    fn is_available(&self, tool: Tool) -> bool {
        self(tool)
    }
}
