use std::fs::File;
use std::io::{BufRead, BufReader, Read};

use camino::Utf8Path;
use flate2::read::MultiGzDecoder;
use xz2::read::XzDecoder;

use crate::error::KiraError;
use crate::names::{COMPRESSION_EXTENSIONS, split_ext};

pub const FASTA_FORMATS: [&str; 3] = ["fna", "fa", "faa"];
pub const GENBANK_FORMATS: [&str; 4] = ["gbff", "gb", "gbk", "gpff"];

/// Counts sequence records (contigs) in an assembly file.
pub trait ContigCounter: Send + Sync {
    fn count(&self, path: &Utf8Path) -> Result<usize, KiraError>;
}

/// Streams the file through the matching decompressor.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileContigCounter;

impl ContigCounter for FileContigCounter {
    fn count(&self, path: &Utf8Path) -> Result<usize, KiraError> {
        count_contigs(path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SequenceFormat {
    Fasta,
    GenBank,
}

impl SequenceFormat {
    fn record_marker(self) -> &'static str {
        match self {
            SequenceFormat::Fasta => ">",
            SequenceFormat::GenBank => "LOCUS ",
        }
    }
}

/// Counts FASTA headers or GenBank `LOCUS` lines in `path`.
///
/// The format comes from the extension without its compression suffix
/// (`x.fna.gz` and `x.fna` are FASTA, `x.gbff.xz` is GenBank).
pub fn count_contigs(path: &Utf8Path) -> Result<usize, KiraError> {
    let format = detect_format(path)?;
    let file = File::open(path.as_std_path()).map_err(|err| contig_error(path, err))?;
    let reader: Box<dyn Read> = match path.extension() {
        Some("gz") => Box::new(MultiGzDecoder::new(file)),
        Some("xz") => Box::new(XzDecoder::new(file)),
        _ => Box::new(file),
    };

    let marker = format.record_marker();
    let mut count = 0;
    for line in BufReader::new(reader).lines() {
        let line = line.map_err(|err| contig_error(path, err))?;
        if line.starts_with(marker) {
            count += 1;
        }
    }
    Ok(count)
}

fn detect_format(path: &Utf8Path) -> Result<SequenceFormat, KiraError> {
    let name = path.file_name().unwrap_or(path.as_str());
    let (_, ext) = split_ext(name);
    let ext = COMPRESSION_EXTENSIONS
        .iter()
        .find_map(|suffix| ext.strip_suffix(*suffix))
        .unwrap_or(ext)
        .trim_start_matches('.');

    if FASTA_FORMATS.contains(&ext) {
        Ok(SequenceFormat::Fasta)
    } else if GENBANK_FORMATS.contains(&ext) {
        Ok(SequenceFormat::GenBank)
    } else {
        let expected = FASTA_FORMATS
            .iter()
            .chain(GENBANK_FORMATS.iter())
            .copied()
            .collect::<Vec<_>>()
            .join(", ");
        Err(KiraError::UnknownSequenceFormat {
            path: path.to_path_buf(),
            expected,
        })
    }
}

fn contig_error(path: &Utf8Path, err: std::io::Error) -> KiraError {
    KiraError::ContigCount {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}
