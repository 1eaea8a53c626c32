use serde::{Deserialize, Serialize};

/// Character reserved as the field separator in group record headers.
pub const RESERVED_SEPARATOR: char = '|';

/// Replacement written wherever the reserved separator appears in an identifier.
pub const SEPARATOR_REPLACEMENT: char = '_';

/// Rewrite the reserved separator in an identifier or header line.
pub fn sanitize_identifier(id: &str) -> String {
    id.replace(RESERVED_SEPARATOR, &SEPARATOR_REPLACEMENT.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sequence {
    pub id: String,
    pub description: Option<String>,
    pub sequence: Vec<u8>,
}

impl Sequence {
    pub fn new(id: String, sequence: Vec<u8>) -> Self {
        Self {
            id,
            description: None,
            sequence,
        }
    }

    pub fn with_description(mut self, description: String) -> Self {
        self.description = Some(description);
        self
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn residues(&self) -> String {
        String::from_utf8_lossy(&self.sequence).to_string()
    }

    pub fn header(&self) -> String {
        match &self.description {
            Some(desc) => format!(">{} {}", self.id, desc),
            None => format!(">{}", self.id),
        }
    }

    /// Copy of this record with the reserved separator rewritten in id and description.
    pub fn sanitized(&self) -> Self {
        Self {
            id: sanitize_identifier(&self.id),
            description: self.description.as_deref().map(sanitize_identifier),
            sequence: self.sequence.clone(),
        }
    }
}
