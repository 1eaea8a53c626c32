use crate::bio::sequence::Sequence;
use crate::OrthoprepError;
use flate2::read::GzDecoder;
use memmap2::Mmap;
use nom::{
    bytes::complete::{tag, take_till},
    character::complete::{line_ending, not_line_ending},
    combinator::{map_res, opt},
    sequence::preceded,
    IResult,
};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Parse a FASTA header line
fn parse_header(input: &[u8]) -> IResult<&[u8], (&str, Option<&str>)> {
    let (input, _) = tag(b">")(input)?;
    let (input, id) = map_res(
        take_till(|c: u8| c == b' ' || c == b'\t' || c == b'\n' || c == b'\r'),
        std::str::from_utf8,
    )(input)?;
    let (input, description) = map_res(
        opt(preceded(
            take_till(|c: u8| c != b' ' && c != b'\t'),
            not_line_ending,
        )),
        |d: Option<&[u8]>| d.map(std::str::from_utf8).transpose(),
    )(input)?;
    let (input, _) = opt(line_ending)(input)?;
    let description = description.filter(|d| !d.trim().is_empty()).map(str::trim_end);
    Ok((input, (id, description)))
}

/// Parse sequence lines until next header or EOF
fn parse_sequence(input: &[u8]) -> IResult<&[u8], Vec<u8>> {
    let mut sequence = Vec::new();
    let mut remaining = input;

    while !remaining.is_empty() && remaining[0] != b'>' {
        let (rest, line) =
            take_till::<_, _, nom::error::Error<_>>(|c: u8| c == b'\n' || c == b'\r')(remaining)?;
        let (rest, _) = opt(line_ending)(rest)?;

        sequence.extend(line.iter().copied().filter(|c| !c.is_ascii_whitespace()));

        // lone carriage return
        remaining = if rest.len() == remaining.len() { &rest[1..] } else { rest };
    }

    Ok((remaining, sequence))
}

/// Parse a single FASTA record
fn parse_record(input: &[u8]) -> IResult<&[u8], Sequence> {
    let (input, (id, description)) = parse_header(input)?;
    let (input, sequence) = parse_sequence(input)?;

    let mut seq = Sequence::new(id.to_string(), sequence);
    if let Some(desc) = description {
        seq = seq.with_description(desc.to_string());
    }

    Ok((input, seq))
}

/// Parse FASTA from bytes
pub fn parse_fasta_from_bytes(data: &[u8]) -> Result<Vec<Sequence>, OrthoprepError> {
    let mut input = data;
    let mut sequences = Vec::new();

    while !input.is_empty() {
        while !input.is_empty() && input[0].is_ascii_whitespace() {
            input = &input[1..];
        }

        if input.is_empty() {
            break;
        }

        if input[0] != b'>' {
            return Err(OrthoprepError::Parse(format!(
                "Expected FASTA header at byte {}",
                data.len() - input.len()
            )));
        }

        match parse_record(input) {
            Ok((remaining, seq)) => {
                if !seq.is_empty() {
                    sequences.push(seq);
                }
                input = remaining;
            }
            Err(e) => {
                return Err(OrthoprepError::Parse(format!("Failed to parse FASTA: {:?}", e)));
            }
        }
    }

    Ok(sequences)
}

/// Parse a FASTA file into sequences (supports .gz compression)
pub fn parse_fasta<P: AsRef<Path>>(path: P) -> Result<Vec<Sequence>, OrthoprepError> {
    let path = path.as_ref();

    if path.extension().and_then(|s| s.to_str()) == Some("gz") {
        parse_fasta_gzip(path)
    } else {
        parse_fasta_uncompressed(path)
    }
}

fn parse_fasta_uncompressed(path: &Path) -> Result<Vec<Sequence>, OrthoprepError> {
    let file = File::open(path)?;
    if file.metadata()?.len() == 0 {
        return Ok(Vec::new());
    }
    let mmap = unsafe { Mmap::map(&file)? };

    parse_fasta_from_bytes(&mmap[..])
}

fn parse_fasta_gzip(path: &Path) -> Result<Vec<Sequence>, OrthoprepError> {
    let file = File::open(path)?;
    let mut decoder = GzDecoder::new(BufReader::new(file));
    let mut buffer = Vec::new();
    decoder.read_to_end(&mut buffer)?;

    parse_fasta_from_bytes(&buffer)
}

/// Write sequences with every record on a single sequence line
pub fn write_single_line_fasta<P: AsRef<Path>>(
    path: P,
    sequences: &[Sequence],
) -> Result<(), OrthoprepError> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write_single_line_to_writer(&mut writer, sequences)?;
    writer.flush()?;
    Ok(())
}

fn write_single_line_to_writer<W: Write>(
    writer: &mut W,
    sequences: &[Sequence],
) -> Result<(), OrthoprepError> {
    for seq in sequences {
        writeln!(writer, "{}", seq.header())?;
        writer.write_all(&seq.sequence)?;
        writeln!(writer)?;
    }
    Ok(())
}

/// Rewrite a gene set as single-line records with the reserved separator
/// replaced in every header. Returns the number of records written.
pub fn normalize_fasta<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
) -> Result<usize, OrthoprepError> {
    let sequences: Vec<Sequence> = parse_fasta(input)?.iter().map(Sequence::sanitized).collect();
    write_single_line_fasta(output, &sequences)?;
    Ok(sequences.len())
}
