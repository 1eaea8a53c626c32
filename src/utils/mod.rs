pub mod parallel;
pub mod progress;

pub use parallel::{effective_concurrency, WorkerPool};
