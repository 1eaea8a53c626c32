//! Ortholog group extraction
//!
//! Walks the groups of an OrthoXML document and resolves each gene
//! reference through the gene index into a species-qualified record.
//! References that do not resolve are dropped without error.

use crate::bio::orthoxml::{GroupReader, OrthoXmlDocument, RawGroup};
use crate::bio::sequence::sanitize_identifier;
use crate::pipeline::registry::SpeciesRegistry;
use crate::Result;
use std::io::BufRead;
use tracing::debug;

const NUMERIC_GROUP_PREFIX: &str = "OG_";

/// One member of a group FASTA
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRecord {
    /// `>group|species|protein`
    pub header: String,
    pub sequence: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrthologGroup {
    pub id: String,
    pub records: Vec<GroupRecord>,
    /// Number of resolved references. Repeated references to one protein
    /// are counted each time.
    pub taxon_count: usize,
}

impl OrthologGroup {
    pub fn to_fasta(&self) -> String {
        let mut fasta = String::new();
        for record in &self.records {
            fasta.push_str(&record.header);
            fasta.push('\n');
            fasta.push_str(&String::from_utf8_lossy(&record.sequence));
            fasta.push('\n');
        }
        fasta
    }
}

/// Purely numeric group ids get an `OG_` prefix; anything else is kept as is.
pub fn normalize_group_id(id: &str) -> String {
    if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) {
        format!("{}{}", NUMERIC_GROUP_PREFIX, id)
    } else {
        id.to_string()
    }
}

/// Lazy, single-pass sequence of resolved groups
pub struct GroupExtractor<'a, R: BufRead> {
    groups: GroupReader<R>,
    registry: &'a SpeciesRegistry,
}

impl<'a, R: BufRead> GroupExtractor<'a, R> {
    pub fn new(groups: GroupReader<R>, registry: &'a SpeciesRegistry) -> Self {
        Self { groups, registry }
    }

    /// Groups encountered in the document so far, retained or not
    pub fn groups_seen(&self) -> usize {
        self.groups.groups_seen()
    }

    fn resolve(&self, raw: RawGroup) -> OrthologGroup {
        let id = normalize_group_id(&raw.id);
        let genes = self.registry.genes();
        let mut records = Vec::with_capacity(raw.gene_refs.len());

        for gene_ref in &raw.gene_refs {
            let Some((protein_id, species_id)) = genes.resolve(gene_ref) else {
                debug!("{}: gene reference '{}' does not resolve", id, gene_ref);
                continue;
            };
            let Some(sequence) = self
                .registry
                .species(species_id)
                .and_then(|species| species.sequence(protein_id))
            else {
                debug!(
                    "{}: protein '{}' is missing from the gene set of {}",
                    id, protein_id, species_id
                );
                continue;
            };

            records.push(GroupRecord {
                header: format!(">{}|{}|{}", id, species_id, sanitize_identifier(protein_id)),
                sequence: sequence.to_vec(),
            });
        }

        OrthologGroup {
            id,
            taxon_count: records.len(),
            records,
        }
    }
}

impl<'a, R: BufRead> Iterator for GroupExtractor<'a, R> {
    type Item = Result<OrthologGroup>;

    fn next(&mut self) -> Option<Self::Item> {
        let raw = self.groups.next()?;
        Some(raw.map(|raw| self.resolve(raw)))
    }
}

/// Extract the groups of `document`, scanning at most `max_groups` of them.
pub fn extract<'a>(
    document: &OrthoXmlDocument,
    registry: &'a SpeciesRegistry,
    max_groups: Option<usize>,
) -> Result<GroupExtractor<'a, std::io::BufReader<std::fs::File>>> {
    Ok(GroupExtractor::new(document.groups(max_groups)?, registry))
}
