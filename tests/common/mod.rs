#![allow(dead_code)]

use anyhow::Result;
use assert_cmd::Command;
use orthoprep::pipeline::{JobDescriptor, JobKind, JobOutcome};
use orthoprep::tools::{Tool, ToolRunner};
use orthoprep::RunOptions;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const VERSION: &str = "2401";

pub const MAPPING: &str = "9606\tHomo sapiens\tHUMAN\n10090\tMus musculus\tMOUSE\n";

pub const HUMAN_FASTA: &str = ">HS|1 first human protein\nMKVLA\nAGTRW\n>HS2\nMPEPT\n>HS3\nMQQQ\n";

pub const MOUSE_FASTA: &str = ">MM1\nMKVLG\nAGTRW\n>MM2\nMPEPS\n";

/// Two mapped species, one unmapped species and four groups:
/// `1` spans both species, `2` only human, `3` only mouse,
/// `4` references the same human gene twice.
pub const ORTHOXML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<orthoXML xmlns="http://orthoXML.org/2011/" version="0.3" origin="test" originVersion="1">
  <species name="Homo sapiens" NCBITaxId="9606">
    <database name="db" version="1">
      <genes>
        <gene id="1" protId="HS|1"/>
        <gene id="2" protId="HS2"/>
        <gene id="3" protId="HS3"/>
      </genes>
    </database>
  </species>
  <species name="Mus musculus" NCBITaxId="10090">
    <database name="db" version="1">
      <genes>
        <gene id="11" protId="MM1"/>
        <gene id="12" protId="MM2"/>
      </genes>
    </database>
  </species>
  <species name="Danio rerio" NCBITaxId="7955">
    <database name="db" version="1">
      <genes>
        <gene id="21" protId="DR1"/>
      </genes>
    </database>
  </species>
  <groups>
    <orthologGroup id="1">
      <geneRef id="1"/>
      <geneRef id="11"/>
      <geneRef id="21"/>
    </orthologGroup>
    <orthologGroup id="2">
      <geneRef id="2"/>
    </orthologGroup>
    <orthologGroup id="3">
      <geneRef id="12"/>
    </orthologGroup>
    <orthologGroup id="4">
      <geneRef id="3"/>
      <geneRef id="3"/>
    </orthologGroup>
  </groups>
</orthoXML>
"#;

pub fn human_id() -> String {
    format!("HUMAN@9606@{}", VERSION)
}

pub fn mouse_id() -> String {
    format!("MOUSE@10090@{}", VERSION)
}

/// Scratch inputs and output directory for one pipeline run
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub input_dir: PathBuf,
    pub gene_set_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        Self::with_document(ORTHOXML)
    }

    pub fn with_document(document: &str) -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let input_dir = temp_dir.path().join("input");
        let gene_set_dir = temp_dir.path().join("genome_dir");
        let output_dir = temp_dir.path().join("output");

        fs::create_dir_all(&input_dir)?;
        fs::create_dir_all(&gene_set_dir)?;

        fs::write(input_dir.join("groups.xml"), document)?;
        fs::write(input_dir.join("mapping.txt"), MAPPING)?;
        fs::write(gene_set_dir.join("Homo sapiens.fa"), HUMAN_FASTA)?;
        fs::write(gene_set_dir.join("Mus musculus.fa"), MOUSE_FASTA)?;

        Ok(Self {
            temp_dir,
            input_dir,
            gene_set_dir,
            output_dir,
        })
    }

    pub fn in_file(&self) -> PathBuf {
        self.input_dir.join("groups.xml")
    }

    pub fn mapping_file(&self) -> PathBuf {
        self.input_dir.join("mapping.txt")
    }

    pub fn options(&self) -> RunOptions {
        let mut options = RunOptions::new(
            self.in_file(),
            &self.output_dir,
            &self.gene_set_dir,
            self.mapping_file(),
            "test_job",
        );
        options.data_version = VERSION.to_string();
        options.cpus = 2;
        options
    }

    pub fn job_dir(&self) -> PathBuf {
        self.output_dir.join("core_orthologs").join("test_job")
    }

    pub fn group_fasta(&self, group: &str) -> PathBuf {
        self.job_dir().join(group).join(format!("{}.fa", group))
    }

    pub fn profile_file(&self, group: &str) -> PathBuf {
        self.job_dir()
            .join(group)
            .join("hmm_dir")
            .join(format!("{}.hmm", group))
    }
}

/// Stand-in for the external tools: records each call and writes a
/// non-empty output file unless the job label is marked as failing.
#[derive(Clone, Default)]
pub struct MockRunner {
    calls: Arc<Mutex<Vec<(JobKind, String)>>>,
    failing: Arc<HashSet<String>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(labels: &[&str]) -> Self {
        Self {
            calls: Arc::default(),
            failing: Arc::new(labels.iter().map(|l| l.to_string()).collect()),
        }
    }

    pub fn calls(&self) -> Vec<(JobKind, String)> {
        let mut calls = self.calls.lock().unwrap().clone();
        calls.sort();
        calls
    }

    pub fn count(&self, kind: JobKind) -> usize {
        self.calls().iter().filter(|(k, _)| *k == kind).count()
    }
}

impl ToolRunner for MockRunner {
    fn run(&self, job: &JobDescriptor) -> JobOutcome {
        self.calls
            .lock()
            .unwrap()
            .push((job.kind, job.label.clone()));

        if self.failing.contains(&job.label) {
            return JobOutcome::failed(job.clone(), Some(1), "mock failure");
        }
        if let Some(parent) = job.output.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&job.output, format!("{} output\n", job.kind)).unwrap();
        JobOutcome::succeeded(job.clone())
    }
}

pub fn all_tools(_tool: Tool) -> bool {
    true
}

pub fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

pub fn orthoprep_cmd() -> Command {
    Command::cargo_bin("orthoprep").unwrap()
}
