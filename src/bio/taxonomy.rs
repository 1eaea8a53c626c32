//! Species name to NCBI taxon id / abbreviation lookup
//!
//! The mapping file is a tab-separated table with one species per line:
//! `<ncbi taxon id>\t<species name as written in the OrthoXML>\t<abbreviation>`.

use crate::OrthoprepError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonEntry {
    pub original_name: String,
    pub numeric_id: String,
    pub abbreviation: String,
}

impl TaxonEntry {
    /// `<abbreviation>@<taxon id>@<version>`, the species identifier used in all output paths
    pub fn species_identifier(&self, version: &str) -> String {
        format!("{}@{}@{}", self.abbreviation, self.numeric_id, version)
    }
}

#[derive(Debug, Default, Clone)]
pub struct TaxonMap {
    by_name: HashMap<String, TaxonEntry>,
}

impl TaxonMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, OrthoprepError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, OrthoprepError> {
        let mut map = Self::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 3 {
                return Err(OrthoprepError::MalformedMappingRow {
                    line: index + 1,
                    fields: fields.len(),
                });
            }

            map.insert(TaxonEntry {
                numeric_id: fields[0].to_string(),
                original_name: fields[1].to_string(),
                abbreviation: fields[2].to_string(),
            });
        }

        Ok(map)
    }

    /// Later rows with the same name replace earlier ones.
    pub fn insert(&mut self, entry: TaxonEntry) {
        self.by_name.insert(entry.original_name.clone(), entry);
    }

    pub fn get(&self, name: &str) -> Option<&TaxonEntry> {
        self.by_name.get(name)
    }

    pub fn taxon_id(&self, name: &str) -> Option<&str> {
        self.get(name).map(|e| e.numeric_id.as_str())
    }

    pub fn abbreviation(&self, name: &str) -> Option<&str> {
        self.get(name).map(|e| e.abbreviation.as_str())
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
