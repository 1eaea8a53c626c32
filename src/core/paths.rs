//! Output directory layout
//!
//! ```text
//! <root>/searchTaxa_dir/<species>/<species>.fa[.checked]
//! <root>/coreTaxa_dir/<species>/<species>.fa        -> ../../searchTaxa_dir/<species>/<species>.fa
//! <root>/coreTaxa_dir/<species>/<species>.<index extension>
//! <root>/core_orthologs/<job>/<group>/<group>.fa
//! <root>/core_orthologs/<job>/<group>/<group>.aln
//! <root>/core_orthologs/<job>/<group>/hmm_dir/<group>.hmm
//! <root>/annotation_dir/<species>.json
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const SEARCH_TAXA_DIR: &str = "searchTaxa_dir";
const CORE_TAXA_DIR: &str = "coreTaxa_dir";
const CORE_ORTHOLOGS_DIR: &str = "core_orthologs";
const ANNOTATION_DIR: &str = "annotation_dir";
const HMM_DIR: &str = "hmm_dir";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
    job_name: String,
}

impl OutputLayout {
    pub fn new<P: AsRef<Path>>(root: P, job_name: &str) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            job_name: job_name.to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    /// Create the top-level directories; existing ones are left alone.
    pub fn create_skeleton(&self) -> io::Result<()> {
        fs::create_dir_all(self.search_taxa_dir())?;
        fs::create_dir_all(self.core_taxa_dir())?;
        fs::create_dir_all(self.job_dir())?;
        fs::create_dir_all(self.annotation_dir())?;
        Ok(())
    }

    pub fn search_taxa_dir(&self) -> PathBuf {
        self.root.join(SEARCH_TAXA_DIR)
    }

    pub fn core_taxa_dir(&self) -> PathBuf {
        self.root.join(CORE_TAXA_DIR)
    }

    pub fn job_dir(&self) -> PathBuf {
        self.root.join(CORE_ORTHOLOGS_DIR).join(&self.job_name)
    }

    pub fn annotation_dir(&self) -> PathBuf {
        self.root.join(ANNOTATION_DIR)
    }

    pub fn species_search_dir(&self, species_id: &str) -> PathBuf {
        self.search_taxa_dir().join(species_id)
    }

    pub fn species_core_dir(&self, species_id: &str) -> PathBuf {
        self.core_taxa_dir().join(species_id)
    }

    pub fn search_fasta(&self, species_id: &str) -> PathBuf {
        self.species_search_dir(species_id)
            .join(format!("{}.fa", species_id))
    }

    pub fn checked_marker(&self, species_id: &str) -> PathBuf {
        self.species_search_dir(species_id)
            .join(format!("{}.fa.checked", species_id))
    }

    pub fn core_fasta(&self, species_id: &str) -> PathBuf {
        self.species_core_dir(species_id)
            .join(format!("{}.fa", species_id))
    }

    /// Target of the core FASTA link, relative to the species core directory
    pub fn core_fasta_link_target(species_id: &str) -> PathBuf {
        Path::new("..")
            .join("..")
            .join(SEARCH_TAXA_DIR)
            .join(species_id)
            .join(format!("{}.fa", species_id))
    }

    /// Database name handed to the index builder
    pub fn index_prefix(&self, species_id: &str) -> PathBuf {
        self.species_core_dir(species_id).join(species_id)
    }

    pub fn index_file(&self, species_id: &str, extension: &str) -> PathBuf {
        self.species_core_dir(species_id)
            .join(format!("{}.{}", species_id, extension))
    }

    pub fn annotation_file(&self, species_id: &str) -> PathBuf {
        self.annotation_dir().join(format!("{}.json", species_id))
    }

    pub fn group_dir(&self, group_id: &str) -> PathBuf {
        self.job_dir().join(group_id)
    }

    pub fn group_fasta(&self, group_id: &str) -> PathBuf {
        self.group_dir(group_id).join(format!("{}.fa", group_id))
    }

    pub fn alignment_file(&self, group_id: &str) -> PathBuf {
        self.group_dir(group_id).join(format!("{}.aln", group_id))
    }

    pub fn hmm_dir(&self, group_id: &str) -> PathBuf {
        self.group_dir(group_id).join(HMM_DIR)
    }

    pub fn profile_file(&self, group_id: &str) -> PathBuf {
        self.hmm_dir(group_id).join(format!("{}.hmm", group_id))
    }
}

/// True when `path` is missing or empty, i.e. the step producing it has to run.
pub fn needs_output(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true)
}
