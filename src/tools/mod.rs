//! External tool integration
//!
//! The pipeline drives makeblastdb, MAFFT or MUSCLE, hmmbuild and the FAS
//! annotator. Only their input/output contracts matter to the scheduler, so
//! they sit behind the `ToolRunner` and `ToolAvailability` traits.

pub mod command;
pub mod traits;
pub mod types;

pub use command::{CommandRunner, PathLookup};
pub use traits::{ToolAvailability, ToolRunner};
pub use types::{AlignTool, Tool};
