//! Species setup: identifier normalisation, gene-set loading and the
//! per-species working files that the index and annotation stages need.

use crate::bio::fasta::{normalize_fasta, parse_fasta};
use crate::bio::orthoxml::SpeciesDeclaration;
use crate::bio::sequence::sanitize_identifier;
use crate::bio::taxonomy::TaxonMap;
use crate::core::paths::{needs_output, OutputLayout};
use crate::pipeline::jobs::{JobDescriptor, JobKind, JobParams};
use crate::{OrthoprepError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A species found in the mapping table, with its gene set loaded.
#[derive(Debug, Clone)]
pub struct NormalizedSpecies {
    name: String,
    identifier: String,
    gene_set: PathBuf,
    // keyed by sanitized protein id
    sequences: HashMap<String, Vec<u8>>,
}

impl NormalizedSpecies {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn gene_set(&self) -> &Path {
        &self.gene_set
    }

    pub fn sequence(&self, protein_id: &str) -> Option<&[u8]> {
        self.sequences
            .get(&sanitize_identifier(protein_id))
            .map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}

/// Gene lookups built while registering species: local gene id to protein
/// id, and protein id to the identifier of the species declaring it.
#[derive(Debug, Default, Clone)]
pub struct GeneIndex {
    protein_of_gene: HashMap<String, String>,
    species_of_protein: HashMap<String, String>,
}

impl GeneIndex {
    pub fn insert(&mut self, local_id: &str, protein_id: &str, species_id: &str) -> Result<()> {
        if let Some(owner) = self.species_of_protein.get(protein_id) {
            if owner != species_id {
                return Err(OrthoprepError::DuplicateProtein {
                    protein: protein_id.to_string(),
                    first: owner.clone(),
                    second: species_id.to_string(),
                });
            }
        }

        self.species_of_protein
            .insert(protein_id.to_string(), species_id.to_string());
        self.protein_of_gene
            .insert(local_id.to_string(), protein_id.to_string());
        Ok(())
    }

    pub fn protein_for(&self, local_id: &str) -> Option<&str> {
        self.protein_of_gene.get(local_id).map(String::as_str)
    }

    pub fn species_for(&self, protein_id: &str) -> Option<&str> {
        self.species_of_protein.get(protein_id).map(String::as_str)
    }

    /// `(protein id, species identifier)` for a local gene id
    pub fn resolve(&self, local_id: &str) -> Option<(&str, &str)> {
        let protein = self.protein_for(local_id)?;
        let species = self.species_for(protein)?;
        Some((protein, species))
    }

    pub fn len(&self) -> usize {
        self.protein_of_gene.len()
    }

    pub fn is_empty(&self) -> bool {
        self.protein_of_gene.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct RegistrySettings {
    pub version: String,
    pub gene_set_dir: PathBuf,
    pub index_extension: String,
    pub annotation_cpus: usize,
}

/// Jobs a freshly registered species still needs
#[derive(Debug, Clone)]
pub struct SpeciesSetup {
    pub identifier: String,
    pub index_job: Option<JobDescriptor>,
    pub annotation_job: Option<JobDescriptor>,
}

/// Registered species and their genes. Filled during the setup stage and
/// only read afterwards.
#[derive(Debug)]
pub struct SpeciesRegistry {
    taxa: TaxonMap,
    layout: OutputLayout,
    settings: RegistrySettings,
    species: HashMap<String, NormalizedSpecies>,
    genes: GeneIndex,
    dropped: Vec<String>,
}

impl SpeciesRegistry {
    pub fn new(taxa: TaxonMap, layout: OutputLayout, settings: RegistrySettings) -> Self {
        Self {
            taxa,
            layout,
            settings,
            species: HashMap::new(),
            genes: GeneIndex::default(),
            dropped: Vec::new(),
        }
    }

    /// Register one declared species.
    ///
    /// Returns `Ok(None)` when the species is not in the mapping table; its
    /// genes are then left out of the gene index.
    pub fn register(&mut self, declaration: &SpeciesDeclaration) -> Result<Option<SpeciesSetup>> {
        let Some(entry) = self.taxa.get(&declaration.name) else {
            warn!(
                "Species '{}' is not in the mapping file, its genes will be ignored",
                declaration.name
            );
            self.dropped.push(declaration.name.clone());
            return Ok(None);
        };
        let identifier = entry.species_identifier(&self.settings.version);

        if self.species.contains_key(&identifier) {
            warn!("Species '{}' is declared more than once", declaration.name);
            self.index_genes(declaration, &identifier)?;
            return Ok(None);
        }

        let gene_set = locate_gene_set(&self.settings.gene_set_dir, &declaration.name)?;
        let sequences: HashMap<String, Vec<u8>> = parse_fasta(&gene_set)?
            .into_iter()
            .map(|seq| (sanitize_identifier(&seq.id), seq.sequence))
            .collect();
        debug!(
            "Loaded {} sequences for {} from {}",
            sequences.len(),
            identifier,
            gene_set.display()
        );

        fs::create_dir_all(self.layout.species_search_dir(&identifier))?;
        fs::create_dir_all(self.layout.species_core_dir(&identifier))?;
        self.materialize_working_copies(&identifier, &gene_set)?;

        let setup = SpeciesSetup {
            index_job: self.index_job(&identifier),
            annotation_job: self.annotation_job(&identifier, &gene_set),
            identifier: identifier.clone(),
        };

        self.index_genes(declaration, &identifier)?;
        self.species.insert(
            identifier.clone(),
            NormalizedSpecies {
                name: declaration.name.clone(),
                identifier,
                gene_set,
                sequences,
            },
        );

        Ok(Some(setup))
    }

    fn index_genes(&mut self, declaration: &SpeciesDeclaration, identifier: &str) -> Result<()> {
        for gene in &declaration.genes {
            self.genes
                .insert(&gene.local_id, &gene.protein_id, identifier)?;
        }
        Ok(())
    }

    /// Single-line copy under searchTaxa_dir, link to it under coreTaxa_dir,
    /// and a fresh `.checked` marker.
    fn materialize_working_copies(&self, identifier: &str, gene_set: &Path) -> Result<()> {
        let search_fasta = self.layout.search_fasta(identifier);
        if !search_fasta.exists() {
            let records = normalize_fasta(gene_set, &search_fasta)?;
            info!("Prepared {} ({} sequences)", search_fasta.display(), records);
        }

        let core_fasta = self.layout.core_fasta(identifier);
        if fs::symlink_metadata(&core_fasta).is_err() {
            link_core_fasta(&core_fasta, identifier, &search_fasta)?;
        }

        let marker = self.layout.checked_marker(identifier);
        fs::write(&marker, chrono::Local::now().to_string())?;
        Ok(())
    }

    fn index_job(&self, identifier: &str) -> Option<JobDescriptor> {
        let index_file = self
            .layout
            .index_file(identifier, &self.settings.index_extension);
        needs_output(&index_file).then(|| {
            JobDescriptor::new(
                JobKind::IndexBuild,
                identifier,
                vec![self.layout.core_fasta(identifier)],
                index_file,
            )
            .with_params(JobParams::Database {
                prefix: self.layout.index_prefix(identifier),
            })
        })
    }

    fn annotation_job(&self, identifier: &str, gene_set: &Path) -> Option<JobDescriptor> {
        let annotation_file = self.layout.annotation_file(identifier);
        needs_output(&annotation_file).then(|| {
            JobDescriptor::new(
                JobKind::Annotation,
                identifier,
                vec![gene_set.to_path_buf()],
                annotation_file,
            )
            .with_params(JobParams::Annotator {
                species_id: identifier.to_string(),
                cpus: self.settings.annotation_cpus,
            })
        })
    }

    pub fn taxa(&self) -> &TaxonMap {
        &self.taxa
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    pub fn genes(&self) -> &GeneIndex {
        &self.genes
    }

    pub fn species(&self, identifier: &str) -> Option<&NormalizedSpecies> {
        self.species.get(identifier)
    }

    pub fn registered(&self) -> impl Iterator<Item = &NormalizedSpecies> {
        self.species.values()
    }

    /// Declared species names that were not found in the mapping table
    pub fn dropped(&self) -> &[String] {
        &self.dropped
    }

    pub fn len(&self) -> usize {
        self.species.len()
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }
}

/// Find the single `<species name>.<ext>` file in the gene-set directory.
pub fn locate_gene_set(dir: &Path, species_name: &str) -> Result<PathBuf> {
    let prefix = format!("{}.", species_name);
    let mut matches = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_match = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(&prefix));
        if is_match && path.is_file() {
            matches.push(path);
        }
    }

    if matches.len() != 1 {
        return Err(OrthoprepError::AmbiguousOrMissingGeneSet {
            species: species_name.to_string(),
            dir: dir.to_path_buf(),
            matches: matches.len(),
        });
    }
    Ok(matches.remove(0))
}

#[cfg(unix)]
fn link_core_fasta(core_fasta: &Path, identifier: &str, _search_fasta: &Path) -> Result<()> {
    std::os::unix::fs::symlink(OutputLayout::core_fasta_link_target(identifier), core_fasta)?;
    Ok(())
}

#[cfg(not(unix))]
fn link_core_fasta(core_fasta: &Path, _identifier: &str, search_fasta: &Path) -> Result<()> {
    fs::copy(search_fasta, core_fasta)?;
    Ok(())
}
