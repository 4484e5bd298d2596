//! NCBI assembly metadata: parsing the `ncbi-genome-download -m` table,
//! exclusion lists and picking one assembly per strain.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::contigs::ContigCounter;
use crate::error::KiraError;
use crate::fs_util::absolutize;
use crate::strain::normalize_strain;

pub const COMPLETE_GENOME: &str = "Complete Genome";
pub const CHROMOSOME: &str = "Chromosome";
pub const SCAFFOLD: &str = "Scaffold";
pub const CONTIG: &str = "Contig";

const ASSEMBLY_LEVELS: [&str; 4] = [COMPLETE_GENOME, CHROMOSOME, SCAFFOLD, CONTIG];

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssemblyRecord {
    #[serde(alias = "#assembly_accession", alias = "# assembly_accession")]
    pub assembly_accession: String,
    pub organism_name: String,
    #[serde(default)]
    pub infraspecific_name: String,
    pub assembly_level: String,
    pub seq_rel_date: String,
    pub local_filename: String,
    /// `local_filename` re-rooted at the download directory.
    #[serde(skip)]
    pub local_path: Utf8PathBuf,
}

impl AssemblyRecord {
    fn level_rank(&self) -> usize {
        ASSEMBLY_LEVELS
            .iter()
            .position(|level| *level == self.assembly_level)
            .unwrap_or(ASSEMBLY_LEVELS.len())
    }

    fn release_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.seq_rel_date, "%Y/%m/%d")
            .or_else(|_| NaiveDate::parse_from_str(&self.seq_rel_date, "%Y-%m-%d"))
            .ok()
    }

    pub fn is_chromosome_level(&self) -> bool {
        self.assembly_level == COMPLETE_GENOME || self.assembly_level == CHROMOSOME
    }
}

/// strain name -> accession -> record
pub type StrainTable = BTreeMap<String, BTreeMap<String, AssemblyRecord>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrainAccession {
    pub strain: String,
    pub accession: String,
}

impl StrainAccession {
    fn new(strain: &str, accession: &str) -> Self {
        Self {
            strain: strain.to_string(),
            accession: accession.to_string(),
        }
    }
}

/// Builds the `"Genus species strain"` key for one table row.
pub fn strain_name(organism: &str, infraspecific: &str) -> Result<String, KiraError> {
    let organism = organism.trim();
    let mut strain = infraspecific.replace("strain=", "").trim().to_string();
    if strain.contains("type strain (") {
        strain = strain.replace("type strain (", "");
        strain.pop();
    }

    let joined = format!("{organism} {strain}");
    let words = joined.split(' ').collect::<Vec<_>>();
    let split = words.len().min(2);
    let organism = words[..split].join(" ");
    let strain = normalize_strain(&words[split..].join(" "))?;
    Ok(format!("{organism} {strain}").trim_end().to_string())
}

/// Reads the metadata table and groups its rows by strain name.
pub fn read_assembly_table(
    tsv: &Utf8Path,
    download_dir: &Utf8Path,
) -> Result<StrainTable, KiraError> {
    let table_error = |message: String| KiraError::AssemblyTable {
        path: tsv.to_path_buf(),
        message,
    };
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .from_path(tsv.as_std_path())
        .map_err(|err| table_error(err.to_string()))?;

    let mut strains = StrainTable::new();
    for row in reader.deserialize::<AssemblyRecord>() {
        let mut record = row.map_err(|err| table_error(err.to_string()))?;
        record.local_path = locate_download(download_dir, &record.local_filename)?;
        let name = strain_name(&record.organism_name, &record.infraspecific_name)?;
        debug!(strain = name.as_str(), accession = record.assembly_accession.as_str(), "assembly");
        strains
            .entry(name)
            .or_default()
            .insert(record.assembly_accession.clone(), record);
    }
    Ok(strains)
}

fn locate_download(download_dir: &Utf8Path, local_filename: &str) -> Result<Utf8PathBuf, KiraError> {
    let dir_name = download_dir.file_name().unwrap_or(download_dir.as_str());
    let relative = local_filename
        .split_once(dir_name)
        .and_then(|(_, rest)| rest.get(1..))
        .ok_or_else(|| KiraError::MissingAssemblyFile(Utf8PathBuf::from(local_filename)))?;
    let path = download_dir.join(relative);
    if !path.as_std_path().is_file() {
        return Err(KiraError::MissingAssemblyFile(path));
    }
    Ok(path)
}

/// One exclusion-list line: a strain pattern and optional accessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exclusion {
    pub pattern: String,
    pub accessions: Vec<String>,
}

impl Exclusion {
    pub fn matches(&self, strain: &str) -> bool {
        strain.contains(&self.pattern)
    }

    pub fn excludes(&self, strain: &str, accession: &str) -> bool {
        self.matches(strain)
            && (self.accessions.is_empty() || self.accessions.iter().any(|acc| acc == accession))
    }
}

/// Reads a tab separated exclusion list. A missing file means no exclusions.
pub fn read_exclusions(path: &Utf8Path) -> Result<Vec<Exclusion>, KiraError> {
    let content = match fs::read_to_string(path.as_std_path()) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            warn!("exclusion list {path} not found");
            return Ok(Vec::new());
        }
        Err(err) => return Err(KiraError::Filesystem(format!("read {path}: {err}"))),
    };

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let mut parts = line.split('\t').map(str::trim);
            Exclusion {
                pattern: parts.next().unwrap_or_default().to_string(),
                accessions: parts
                    .filter(|part| !part.is_empty())
                    .map(str::to_string)
                    .collect(),
            }
        })
        .collect())
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FilterOutcome {
    /// strain -> chosen assembly
    pub valid: BTreeMap<String, AssemblyRecord>,
    pub excluded: Vec<StrainAccession>,
    /// Lower ranked assemblies of strains with several candidates.
    pub skipped: Vec<StrainAccession>,
    pub too_many_contigs: Vec<StrainAccession>,
}

/// Applies the exclusion list and keeps the best assembly per strain.
///
/// Candidates rank by assembly level (complete genome first) and then by
/// release date, newest first.
pub fn filter_downloads(strains: &StrainTable, exclusions: &[Exclusion]) -> FilterOutcome {
    let mut outcome = FilterOutcome::default();
    for (strain, records) in strains {
        let mut candidates = Vec::new();
        for (accession, record) in records {
            if exclusions.iter().any(|ex| ex.excludes(strain, accession)) {
                outcome.excluded.push(StrainAccession::new(strain, accession));
            } else {
                candidates.push(record);
            }
        }

        candidates.sort_by_key(|record| (record.level_rank(), Reverse(record.release_date())));
        let mut candidates = candidates.into_iter();
        let Some(best) = candidates.next() else {
            continue;
        };
        outcome.skipped.extend(
            candidates.map(|record| StrainAccession::new(strain, &record.assembly_accession)),
        );
        outcome.valid.insert(strain.clone(), best.clone());
    }
    outcome
}

/// Drops draft assemblies with more than `max_contigs` contigs.
///
/// Complete genomes and chromosome level assemblies are never counted.
pub fn filter_too_many_contigs(
    outcome: &mut FilterOutcome,
    max_contigs: usize,
    counter: &dyn ContigCounter,
) -> Result<(), KiraError> {
    info!(
        "checking contig number of {} assemblies, complete genome and chromosome level skipped",
        outcome.valid.len()
    );
    let mut dropped = Vec::new();
    for (strain, record) in &outcome.valid {
        if record.is_chromosome_level() {
            continue;
        }
        let contigs = counter.count(&record.local_path)?;
        debug!(strain = strain.as_str(), contigs, "counted contigs");
        if contigs > max_contigs {
            dropped.push(strain.clone());
        }
    }
    for strain in dropped {
        if let Some(record) = outcome.valid.remove(&strain) {
            outcome
                .too_many_contigs
                .push(StrainAccession::new(&strain, &record.assembly_accession));
        }
    }
    Ok(())
}

/// `target` made absolute, or the download directory with a `-ready` suffix.
pub fn generate_target_dir(
    download_dir: &Utf8Path,
    target: Option<&Utf8Path>,
) -> Result<Utf8PathBuf, KiraError> {
    match target {
        Some(target) => absolutize(target),
        None => {
            let base = absolutize(download_dir)?;
            Ok(Utf8PathBuf::from(format!("{base}-ready")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(accession: &str, level: &str, date: &str) -> AssemblyRecord {
        AssemblyRecord {
            assembly_accession: accession.to_string(),
            organism_name: "Streptomyces albidoflavus".to_string(),
            infraspecific_name: "strain=J1074".to_string(),
            assembly_level: level.to_string(),
            seq_rel_date: date.to_string(),
            local_filename: String::new(),
            local_path: Utf8PathBuf::new(),
        }
    }

    #[test]
    fn strain_names_are_normalized() {
        let name = strain_name(
            "Streptomyces avermitilis MA-4680 = NBRC 14893",
            "strain=MA-4680",
        )
        .unwrap();
        assert_eq!(name, "Streptomyces avermitilis MA-4680 NBRC 14893");

        let name = strain_name(
            "Streptomyces leeuwenhoekii",
            "strain=type strain (C34 = DSM 42122 = NRRL B-24963)",
        )
        .unwrap();
        assert_eq!(name, "Streptomyces leeuwenhoekii C34 DSM 42122 NRRL B-24963");

        assert_eq!(strain_name("Streptomyces sp.", "").unwrap(), "Streptomyces sp.");
    }

    #[test]
    fn best_assembly_by_level_then_date() {
        let mut strains = StrainTable::new();
        let records = strains.entry("S a J1074".to_string()).or_default();
        records.insert("GCF_1".to_string(), record("GCF_1", CONTIG, "2020/01/01"));
        records.insert("GCF_2".to_string(), record("GCF_2", COMPLETE_GENOME, "2013/03/01"));
        records.insert("GCF_3".to_string(), record("GCF_3", COMPLETE_GENOME, "2015/06/01"));

        let outcome = filter_downloads(&strains, &[]);
        assert_eq!(outcome.valid["S a J1074"].assembly_accession, "GCF_3");
        let skipped = outcome
            .skipped
            .iter()
            .map(|item| item.accession.as_str())
            .collect::<Vec<_>>();
        assert_eq!(skipped, vec!["GCF_2", "GCF_1"]);
    }

    #[test]
    fn exclusions_by_pattern_and_accession() {
        let mut strains = StrainTable::new();
        strains
            .entry("Streptomyces coelicolor M1154".to_string())
            .or_default()
            .insert("GCF_9".to_string(), record("GCF_9", CONTIG, "2020/01/01"));
        let leeu = strains
            .entry("Streptomyces leeuwenhoekii C34".to_string())
            .or_default();
        leeu.insert("GCF_5".to_string(), record("GCF_5", SCAFFOLD, "2015/01/01"));
        leeu.insert("GCF_6".to_string(), record("GCF_6", CONTIG, "2016/01/01"));

        let exclusions = vec![
            Exclusion {
                pattern: "Streptomyces coelicolor M1154".to_string(),
                accessions: Vec::new(),
            },
            Exclusion {
                pattern: "Streptomyces leeuwenhoekii".to_string(),
                accessions: vec!["GCF_5".to_string()],
            },
        ];
        let outcome = filter_downloads(&strains, &exclusions);

        assert_eq!(outcome.excluded.len(), 2);
        assert_eq!(outcome.valid.len(), 1);
        assert_eq!(
            outcome.valid["Streptomyces leeuwenhoekii C34"].assembly_accession,
            "GCF_6"
        );
        assert!(outcome.skipped.is_empty());
    }
}
