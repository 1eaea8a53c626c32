//! Streaming OrthoXML access
//!
//! Two independent passes are made over a document: one collecting the
//! declared species and their genes, and a lazy one yielding ortholog groups
//! in the order their opening tags appear. Nested groups are reported on
//! their own and also contribute their gene references to every enclosing
//! group.

use crate::OrthoprepError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

const SPECIES: &[u8] = b"species";
const GENE: &[u8] = b"gene";
const ORTHOLOG_GROUP: &[u8] = b"orthologGroup";
const GENE_REF: &[u8] = b"geneRef";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneDeclaration {
    pub local_id: String,
    pub protein_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeciesDeclaration {
    pub name: String,
    pub genes: Vec<GeneDeclaration>,
}

/// An ortholog group as written in the document: its raw id and the local
/// ids of every gene reference beneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawGroup {
    pub id: String,
    pub gene_refs: Vec<String>,
}

/// Handle on an OrthoXML file on disk
#[derive(Debug, Clone)]
pub struct OrthoXmlDocument {
    path: PathBuf,
}

impl OrthoXmlDocument {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, OrthoprepError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(OrthoprepError::MissingInput {
                what: "Input OrthoXML file",
                path: path.to_path_buf(),
            });
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn species(&self) -> Result<Vec<SpeciesDeclaration>, OrthoprepError> {
        read_species(BufReader::new(File::open(&self.path)?))
    }

    pub fn groups(&self, max_groups: Option<usize>) -> Result<GroupReader<BufReader<File>>, OrthoprepError> {
        Ok(GroupReader::new(
            BufReader::new(File::open(&self.path)?),
            max_groups,
        ))
    }
}

fn xml_reader<R: BufRead>(input: R) -> Reader<R> {
    let mut reader = Reader::from_reader(input);
    reader.config_mut().trim_text(true);
    reader
}

fn xml_error(err: impl std::fmt::Display, position: impl std::fmt::Display) -> OrthoprepError {
    OrthoprepError::Xml(format!("{} (at byte {})", err, position))
}

fn attribute(element: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>, OrthoprepError> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| OrthoprepError::Xml(e.to_string()))?;
        if attr.key.local_name().as_ref() == name {
            let value = attr
                .unescape_value()
                .map_err(|e| OrthoprepError::Xml(e.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Collect every `species` element together with the genes declared under it.
pub fn read_species<R: BufRead>(input: R) -> Result<Vec<SpeciesDeclaration>, OrthoprepError> {
    let mut reader = xml_reader(input);
    let mut buf = Vec::new();
    let mut species = Vec::new();
    let mut current: Option<SpeciesDeclaration> = None;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| xml_error(e, reader.buffer_position()))?;

        match event {
            Event::Start(ref e) | Event::Empty(ref e) if e.local_name().as_ref() == SPECIES => {
                let declaration = SpeciesDeclaration {
                    name: attribute(e, b"name")?.unwrap_or_default(),
                    genes: Vec::new(),
                };
                if matches!(event, Event::Empty(_)) {
                    species.push(declaration);
                } else {
                    current = Some(declaration);
                }
            }
            Event::Start(ref e) | Event::Empty(ref e) if e.local_name().as_ref() == GENE => {
                if let Some(declaration) = current.as_mut() {
                    match (attribute(e, b"id")?, attribute(e, b"protId")?) {
                        (Some(local_id), Some(protein_id)) => declaration.genes.push(GeneDeclaration {
                            local_id,
                            protein_id,
                        }),
                        _ => tracing::debug!(
                            "Skipping gene without id/protId in species '{}'",
                            declaration.name
                        ),
                    }
                }
            }
            Event::End(ref e) if e.local_name().as_ref() == SPECIES => {
                if let Some(declaration) = current.take() {
                    species.push(declaration);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(species)
}

enum Tag {
    GroupOpen(Option<String>),
    GroupEmpty(Option<String>),
    GroupClose,
    GeneRef(Option<String>),
    Eof,
    Other,
}

struct PendingGroup {
    id: String,
    gene_refs: Vec<String>,
    closed: bool,
}

/// Lazy iterator over the identified ortholog groups of a document.
///
/// Only `orthologGroup` elements carrying an `id` count as groups. Once more
/// than `max_groups` of them have been seen no new group is started; groups
/// that are still open at that point are completed and then reading stops.
pub struct GroupReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    max_groups: Option<usize>,
    seen: usize,
    limit_reached: bool,
    finished: bool,
    // one entry per open orthologGroup element, Some(slot) when tracked
    open: Vec<Option<usize>>,
    pending: VecDeque<PendingGroup>,
    first_slot: usize,
}

impl<R: BufRead> GroupReader<R> {
    pub fn new(input: R, max_groups: Option<usize>) -> Self {
        Self {
            reader: xml_reader(input),
            buf: Vec::new(),
            max_groups,
            seen: 0,
            limit_reached: false,
            finished: false,
            open: Vec::new(),
            pending: VecDeque::new(),
            first_slot: 0,
        }
    }

    /// Number of identified groups encountered so far, including the one
    /// that tripped the limit.
    pub fn groups_seen(&self) -> usize {
        self.seen
    }

    pub fn limit_reached(&self) -> bool {
        self.limit_reached
    }

    fn next_tag(&mut self) -> Result<Tag, OrthoprepError> {
        let event = self
            .reader
            .read_event_into(&mut self.buf)
            .map_err(|e| xml_error(e, self.reader.buffer_position()))?;

        let tag = match event {
            Event::Start(ref e) if e.local_name().as_ref() == ORTHOLOG_GROUP => {
                Tag::GroupOpen(attribute(e, b"id")?)
            }
            Event::Empty(ref e) if e.local_name().as_ref() == ORTHOLOG_GROUP => {
                Tag::GroupEmpty(attribute(e, b"id")?)
            }
            Event::End(ref e) if e.local_name().as_ref() == ORTHOLOG_GROUP => Tag::GroupClose,
            Event::Start(ref e) | Event::Empty(ref e) if e.local_name().as_ref() == GENE_REF => {
                Tag::GeneRef(attribute(e, b"id")?)
            }
            Event::Eof => Tag::Eof,
            _ => Tag::Other,
        };
        self.buf.clear();
        Ok(tag)
    }

    /// Register a newly opened group, returning its slot if it is tracked.
    fn start_group(&mut self, id: Option<String>) -> Option<usize> {
        // an empty id counts as no id
        let id = id.filter(|id| !id.is_empty())?;
        if self.limit_reached {
            return None;
        }

        self.seen += 1;
        if self.max_groups.is_some_and(|max| self.seen > max) {
            self.limit_reached = true;
            return None;
        }

        let slot = self.first_slot + self.pending.len();
        self.pending.push_back(PendingGroup {
            id,
            gene_refs: Vec::new(),
            closed: false,
        });
        Some(slot)
    }

    fn pending_mut(&mut self, slot: usize) -> &mut PendingGroup {
        &mut self.pending[slot - self.first_slot]
    }

    fn has_open_tracked_group(&self) -> bool {
        self.open.iter().any(Option::is_some)
    }

    fn pop_completed(&mut self) -> Option<RawGroup> {
        if !self.pending.front().is_some_and(|g| g.closed) {
            return None;
        }
        let group = self.pending.pop_front()?;
        self.first_slot += 1;
        Some(RawGroup {
            id: group.id,
            gene_refs: group.gene_refs,
        })
    }

    fn close_all(&mut self) {
        for group in self.pending.iter_mut() {
            group.closed = true;
        }
    }
}

impl<R: BufRead> Iterator for GroupReader<R> {
    type Item = Result<RawGroup, OrthoprepError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(group) = self.pop_completed() {
                return Some(Ok(group));
            }
            if self.finished {
                return None;
            }
            if self.limit_reached && !self.has_open_tracked_group() {
                self.finished = true;
                self.close_all();
                continue;
            }

            let tag = match self.next_tag() {
                Ok(tag) => tag,
                Err(e) => {
                    self.finished = true;
                    self.pending.clear();
                    return Some(Err(e));
                }
            };

            match tag {
                Tag::GroupOpen(id) => {
                    let slot = self.start_group(id);
                    self.open.push(slot);
                }
                Tag::GroupEmpty(id) => {
                    if let Some(slot) = self.start_group(id) {
                        self.pending_mut(slot).closed = true;
                    }
                }
                Tag::GroupClose => {
                    if let Some(Some(slot)) = self.open.pop() {
                        self.pending_mut(slot).closed = true;
                    }
                }
                Tag::GeneRef(Some(gene_id)) => {
                    let slots: Vec<usize> = self.open.iter().flatten().copied().collect();
                    for slot in slots {
                        self.pending_mut(slot).gene_refs.push(gene_id.clone());
                    }
                }
                Tag::Eof => {
                    self.finished = true;
                    self.close_all();
                }
                Tag::GeneRef(None) | Tag::Other => {}
            }
        }
    }
}
