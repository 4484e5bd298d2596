use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::Local;
use serde::Serialize;
use tracing::{info, warn};

use crate::assembly::{
    FilterOutcome, StrainAccession, filter_downloads, filter_too_many_contigs, generate_target_dir,
    read_assembly_table, read_exclusions,
};
use crate::contigs::ContigCounter;
use crate::dedup::{DuplicateMember, DuplicateReport, resolve};
use crate::domain::{Collections, KeepPolicy, NamePair, RenameMap};
use crate::error::KiraError;
use crate::fs_util::{CollectionLister, Materializer};
use crate::names::{NameSafety, scan_illegal, split_ext};

/// Receives the human readable report, one line at a time.
pub trait ReportSink {
    fn line(&self, line: &str);
}

fn emit(sink: &dyn ReportSink, lines: impl IntoIterator<Item = String>) {
    for line in lines {
        sink.line(&line);
    }
}

/// Diagnostics of one collection checked on its own.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionCheck {
    pub collection: Utf8PathBuf,
    pub corrections: Vec<NamePair>,
    pub report: DuplicateReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub policy: KeepPolicy,
    pub individual: Vec<CollectionCheck>,
    pub mapping: RenameMap,
    pub report: DuplicateReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct CopyPlan {
    pub source: Utf8PathBuf,
    pub destination: Utf8PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct CombineResult {
    pub policy: KeepPolicy,
    pub target_dir: Option<Utf8PathBuf>,
    /// Whether the copies were performed or only planned.
    pub copied: bool,
    pub copies: Vec<CopyPlan>,
    pub excluded: Vec<DuplicateMember>,
}

#[derive(Debug, Clone)]
pub struct GatherRequest {
    pub tsv: Utf8PathBuf,
    pub download_dir: Utf8PathBuf,
    pub exclude_list: Option<Utf8PathBuf>,
    pub max_contigs: Option<usize>,
    pub target_dir: Option<Utf8PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GatheredAssembly {
    pub strain: String,
    pub accession: String,
    pub file_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GatherResult {
    pub target_dir: Utf8PathBuf,
    pub include_list: Utf8PathBuf,
    pub exclude_list: Utf8PathBuf,
    pub gathered: Vec<GatheredAssembly>,
    pub excluded: Vec<StrainAccession>,
    pub skipped: Vec<StrainAccession>,
    pub too_many_contigs: Vec<StrainAccession>,
}

#[derive(Clone)]
pub struct App<L: CollectionLister, S: NameSafety, M: Materializer> {
    lister: L,
    safety: S,
    materializer: M,
}

impl<L: CollectionLister, S: NameSafety, M: Materializer> App<L, S, M> {
    pub fn new(lister: L, safety: S, materializer: M) -> Self {
        Self {
            lister,
            safety,
            materializer,
        }
    }

    /// Checks every collection on its own, then all of them combined.
    ///
    /// Only the combined pass produces the returned mapping; the individual
    /// passes show which duplicates already exist inside one collection and
    /// always run under [`KeepPolicy::First`].
    pub fn check(
        &self,
        collections: &[Utf8PathBuf],
        policy: KeepPolicy,
        sink: &dyn ReportSink,
    ) -> Result<CheckResult, KiraError> {
        let mut combined = Collections::new();
        let mut individual = Vec::with_capacity(collections.len());
        sink.line("");
        for key in collections {
            if combined.contains_key(key) {
                warn!("collection {key} given more than once, ignoring repeat");
                continue;
            }
            sink.line(&format!("Checking dir {key} individually."));
            let names = self.lister.list(key)?;
            let scan = scan_illegal(&names, &self.safety)?;
            emit(sink, scan.render_lines());

            // diagnostic only, the requested policy applies to the combined pass
            let single = Collections::from([(key.clone(), scan.pairs.clone())]);
            let report = resolve(&single, KeepPolicy::First).report;
            emit(sink, report.render_lines());

            individual.push(CollectionCheck {
                collection: key.clone(),
                corrections: scan
                    .pairs
                    .iter()
                    .filter(|pair| pair.corrected.is_some())
                    .cloned()
                    .collect(),
                report,
            });
            combined.extend(single);
        }

        sink.line("Checking dirs as combined:");
        let resolution = resolve(&combined, policy);
        emit(sink, resolution.report.render_lines());
        info!(
            collections = combined.len(),
            duplicates = resolution.report.groups.len(),
            "duplicate check finished"
        );

        Ok(CheckResult {
            policy,
            individual,
            mapping: resolution.mapping,
            report: resolution.report,
        })
    }

    /// Resolves names across `collections` and copies the result into
    /// `target`. Without a target nothing is copied.
    pub fn combine(
        &self,
        collections: &[Utf8PathBuf],
        target: Option<&Utf8Path>,
        policy: KeepPolicy,
        sink: &dyn ReportSink,
    ) -> Result<CombineResult, KiraError> {
        if let Some(target) = target {
            if target.as_std_path().exists() {
                return Err(KiraError::TargetExists(target.to_path_buf()));
            }
        }

        let checked = self.check(collections, policy, sink)?;
        let target_dir = target.map(Utf8Path::to_path_buf);
        let copies = checked
            .mapping
            .iter()
            .flat_map(|(key, outcomes)| {
                let destination_root = target_dir.clone().unwrap_or_default();
                outcomes.iter().map(move |outcome| CopyPlan {
                    source: key.join(&outcome.original),
                    destination: destination_root.join(outcome.target_name()),
                })
            })
            .collect::<Vec<_>>();

        if let Some(target) = target {
            fs::create_dir_all(target.as_std_path())
                .map_err(|err| KiraError::Filesystem(format!("create {target}: {err}")))?;
            for (key, outcomes) in &checked.mapping {
                for outcome in outcomes {
                    self.materializer
                        .copy(key, &outcome.original, target, outcome.target_name())?;
                }
            }
            info!(files = copies.len(), "combined into {target}");
        }

        Ok(CombineResult {
            policy,
            target_dir,
            copied: target.is_some(),
            copies,
            excluded: checked.report.excluded().cloned().collect(),
        })
    }

    /// Picks one assembly per strain out of a download and copies it under a
    /// safe strain name into the target directory.
    pub fn gather(
        &self,
        request: &GatherRequest,
        counter: &dyn ContigCounter,
        sink: &dyn ReportSink,
    ) -> Result<GatherResult, KiraError> {
        let target_dir = generate_target_dir(&request.download_dir, request.target_dir.as_deref())?;
        if target_dir.as_std_path().exists() {
            return Err(KiraError::TargetExists(target_dir));
        }

        let strains = read_assembly_table(&request.tsv, &request.download_dir)?;
        let exclusions = match &request.exclude_list {
            Some(path) => read_exclusions(path)?,
            None => Vec::new(),
        };
        let mut outcome = filter_downloads(&strains, &exclusions);
        if let Some(max_contigs) = request.max_contigs {
            filter_too_many_contigs(&mut outcome, max_contigs, counter)?;
        }

        let gathered = self.plan_gather(&outcome, &target_dir, sink)?;
        fs::create_dir_all(target_dir.as_std_path())
            .map_err(|err| KiraError::Filesystem(format!("create {target_dir}: {err}")))?;
        for item in &gathered {
            let source = &outcome.valid[&item.strain].local_path;
            let (dir, name) = source
                .parent()
                .zip(source.file_name())
                .ok_or_else(|| KiraError::MissingAssemblyFile(source.clone()))?;
            self.materializer.copy(dir, name, &target_dir, &item.file_name)?;
        }

        let include_list = Utf8PathBuf::from(format!("{target_dir}-included.tsv"));
        write_list(
            &include_list,
            "strain\taccession\tsafe_name",
            gathered.iter().map(|item| {
                let (base, _) = split_ext(&item.file_name);
                format!("{}\t{}\t{base}", item.strain, item.accession)
            }),
        )?;

        let exclude_list = Utf8PathBuf::from(format!("{target_dir}-excluded.tsv"));
        write_list(
            &exclude_list,
            "strain\taccession",
            outcome
                .excluded
                .iter()
                .chain(&outcome.skipped)
                .chain(&outcome.too_many_contigs)
                .map(|item| format!("{}\t{}", item.strain, item.accession)),
        )?;
        info!(assemblies = gathered.len(), "gathered into {target_dir}");

        Ok(GatherResult {
            target_dir,
            include_list,
            exclude_list,
            gathered,
            excluded: outcome.excluded,
            skipped: outcome.skipped,
            too_many_contigs: outcome.too_many_contigs,
        })
    }

    // Safe strain names can collide ("A/B" and "A B"), so they go through the
    // same resolver as combined databases, keeping every strain.
    fn plan_gather(
        &self,
        outcome: &FilterOutcome,
        target_dir: &Utf8Path,
        sink: &dyn ReportSink,
    ) -> Result<Vec<GatheredAssembly>, KiraError> {
        let mut pairs = Vec::with_capacity(outcome.valid.len());
        let mut originals = Vec::with_capacity(outcome.valid.len());
        for (strain, record) in &outcome.valid {
            let file_name = record.local_path.file_name().unwrap_or_default();
            let (_, ext) = split_ext(file_name);
            let original = format!("{strain}{ext}");
            let safe = format!("{}{ext}", self.safety.safe_name(strain)?);
            let corrected = (safe != original).then_some(safe);
            originals.push((original.clone(), strain, record));
            pairs.push(NamePair {
                original,
                corrected,
            });
        }

        let key = target_dir.to_path_buf();
        let resolution = resolve(&Collections::from([(key.clone(), pairs)]), KeepPolicy::All);
        if !resolution.report.groups.is_empty() {
            emit(sink, resolution.report.render_lines());
        }
        let outputs = resolution.mapping.get(&key).cloned().unwrap_or_default();

        let mut gathered = Vec::with_capacity(originals.len());
        for (original, strain, record) in originals {
            let file_name = outputs
                .iter()
                .find(|outcome| outcome.original == original)
                .map(|outcome| outcome.target_name().to_string())
                .unwrap_or(original);
            gathered.push(GatheredAssembly {
                strain: strain.clone(),
                accession: record.assembly_accession.clone(),
                file_name,
            });
        }
        Ok(gathered)
    }
}

fn write_list(
    path: &Utf8Path,
    columns: &str,
    rows: impl Iterator<Item = String>,
) -> Result<(), KiraError> {
    let mut content = format!(
        "# generated by kira-dbc {} at {}\n# {columns}\n",
        env!("CARGO_PKG_VERSION"),
        Local::now().to_rfc3339()
    );
    for row in rows {
        content.push_str(&row);
        content.push('\n');
    }
    fs::write(path.as_std_path(), content)
        .map_err(|err| KiraError::Filesystem(format!("write {path}: {err}")))
}
