use std::fs::File;
use std::io::Write;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;
use flate2::Compression;
use flate2::write::GzEncoder;
use xz2::write::XzEncoder;

use kira_db_combine::contigs::count_contigs;
use kira_db_combine::error::KiraError;

const FASTA: &str = ">ctg1 Streptomyces\nACGTACGT\n>ctg2\nACGT\n>ctg3\nAC\n";
const GENBANK: &str = "LOCUS       WP_1   120 aa   linear   BCT 01-JAN-2020\nDEFINITION  x.\n//\nLOCUS       WP_2   80 aa   linear   BCT 01-JAN-2020\n//\n";

fn temp_path(dir: &tempfile::TempDir, name: &str) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().join(name)).unwrap()
}

#[test]
fn counts_gzipped_fasta_headers() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "test.fna.gz");
    let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
    encoder.write_all(FASTA.as_bytes()).unwrap();
    encoder.finish().unwrap();

    assert_eq!(count_contigs(&path).unwrap(), 3);
}

#[test]
fn counts_xz_genbank_loci() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "test.gpff.xz");
    let mut encoder = XzEncoder::new(File::create(&path).unwrap(), 6);
    encoder.write_all(GENBANK.as_bytes()).unwrap();
    encoder.finish().unwrap();

    assert_eq!(count_contigs(&path).unwrap(), 2);
}

#[test]
fn counts_uncompressed_fasta() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "draft.fna");
    std::fs::write(&path, FASTA).unwrap();

    assert_eq!(count_contigs(&path).unwrap(), 3);
}

#[test]
fn unknown_format_fails_before_reading() {
    let err = count_contigs(&Utf8PathBuf::from("abc.unknown.gz")).unwrap_err();
    assert_matches!(err, KiraError::UnknownSequenceFormat { .. });
}

#[test]
fn missing_file_is_a_count_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = count_contigs(&temp_path(&dir, "absent.fna.gz")).unwrap_err();
    assert_matches!(err, KiraError::ContigCount { .. });
}
