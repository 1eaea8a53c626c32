pub mod bio;
pub mod cli;
pub mod core;
pub mod pipeline;
pub mod tools;
pub mod utils;

pub use crate::pipeline::orchestrator::{Orchestrator, RunOptions, RunSummary};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrthoprepError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Malformed mapping row at line {line}: expected 3 tab-separated fields, found {fields}")]
    MalformedMappingRow { line: usize, fields: usize },

    #[error("Expected exactly one gene set for '{species}' in {}, found {matches}", dir.display())]
    AmbiguousOrMissingGeneSet {
        species: String,
        dir: PathBuf,
        matches: usize,
    },

    #[error("Protein '{protein}' is declared by both {first} and {second}")]
    DuplicateProtein {
        protein: String,
        first: String,
        second: String,
    },

    #[error("{what} not found: {}", path.display())]
    MissingInput { what: &'static str, path: PathBuf },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Worker pool error: {0}")]
    WorkerPool(String),
}

pub type Result<T> = std::result::Result<T, OrthoprepError>;
