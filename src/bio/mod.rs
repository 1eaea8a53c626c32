pub mod fasta;
pub mod orthoxml;
pub mod sequence;
pub mod taxonomy;

pub use sequence::{sanitize_identifier, Sequence};
pub use taxonomy::{TaxonEntry, TaxonMap};
