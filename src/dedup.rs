//! Case-insensitive duplicate detection and resolution across collections.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

use camino::Utf8PathBuf;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::domain::{Collections, KeepPolicy, RenameMap, RenameOutcome, name_order};
use crate::names::split_ext;

pub const SYNTHETIC_SUFFIX: &str = "_name_rep";

static ASSIGNED_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_name_rep\d+$").expect("suffix pattern compiles"));

/// What happened to one item that took part in a collision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "name", rename_all = "snake_case")]
pub enum Disposition {
    KeptAsIs,
    Renamed(String),
    Excluded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateMember {
    pub collection: Utf8PathBuf,
    pub original: String,
    pub disposition: Disposition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    /// Lower-cased base identifier shared by the members.
    pub name: String,
    pub members: Vec<DuplicateMember>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateReport {
    pub groups: Vec<DuplicateGroup>,
    pub unique_count: usize,
    pub total_checked: usize,
    pub collections: Vec<Utf8PathBuf>,
}

impl DuplicateReport {
    pub fn excluded(&self) -> impl Iterator<Item = &DuplicateMember> {
        self.groups
            .iter()
            .flat_map(|group| group.members.iter())
            .filter(|member| member.disposition == Disposition::Excluded)
    }

    pub fn render_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for group in &self.groups {
            lines.push(format!("Found duplicated name {}:", group.name));
            for member in &group.members {
                lines.push(format!("\t{}", member.collection.join(&member.original)));
                match &member.disposition {
                    Disposition::KeptAsIs => {}
                    Disposition::Renamed(name) => {
                        lines.push(format!("\t\t{}", member.collection.join(name)));
                    }
                    Disposition::Excluded => lines.push("\t\t(will be excluded)".to_string()),
                }
            }
        }

        if self.groups.is_empty() {
            lines.push("No possible duplication found in dir(s):".to_string());
            lines.extend(self.collections.iter().map(|key| format!("\t{key}")));
        } else {
            lines.push(format!(
                "Found {} none unique name(s), {} unique one(s).",
                self.groups.len(),
                self.unique_count
            ));
        }
        lines.push(format!("Total checked files: {}", self.total_checked));
        lines.push(String::new());
        lines
    }
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub mapping: RenameMap,
    pub report: DuplicateReport,
}

/// Resolves name collisions over every collection.
///
/// Collections are visited in key order and items in their given order, so
/// the first item claiming a base identifier keeps it. Comparison is on the
/// lower-cased base identifier of the effective name; output names keep
/// their casing.
pub fn resolve(collections: &Collections, policy: KeepPolicy) -> Resolution {
    // lower-cased slot -> the item holding it, synthetic slots included
    let mut claimants = HashMap::<String, DuplicateMember>::new();
    let mut unique_seen = HashSet::<String>::new();
    let mut groups = BTreeMap::<String, Vec<DuplicateMember>>::new();
    let mut mapping = RenameMap::new();
    let mut total_checked = 0;

    for (key, pairs) in collections {
        total_checked += pairs.len();
        let mut outcomes = Vec::with_capacity(pairs.len());

        for pair in pairs {
            let (base, ext) = split_ext(pair.effective());
            let lowered = base.to_lowercase();
            unique_seen.insert(lowered.clone());

            let Some(claimant) = claimants.get(&lowered) else {
                let disposition = match &pair.corrected {
                    Some(corrected) => Disposition::Renamed(corrected.clone()),
                    None => Disposition::KeptAsIs,
                };
                claimants.insert(lowered, member(key, &pair.original, disposition));
                outcomes.push(RenameOutcome {
                    original: pair.original.clone(),
                    output: pair.corrected.clone(),
                });
                continue;
            };

            let group = groups
                .entry(lowered)
                .or_insert_with(|| vec![claimant.clone()]);
            match policy {
                KeepPolicy::First => {
                    debug!(collection = %key, name = pair.original.as_str(), "excluding duplicate");
                    group.push(member(key, &pair.original, Disposition::Excluded));
                }
                KeepPolicy::All => {
                    let slot = claim_suffixed(base, |slot| !claimants.contains_key(slot));
                    let output = format!("{slot}{ext}");
                    debug!(
                        collection = %key,
                        name = pair.original.as_str(),
                        output = output.as_str(),
                        "renaming duplicate"
                    );
                    let renamed = member(key, &pair.original, Disposition::Renamed(output.clone()));
                    group.push(renamed.clone());
                    claimants.insert(slot.to_lowercase(), renamed);
                    outcomes.push(RenameOutcome {
                        original: pair.original.clone(),
                        output: Some(output),
                    });
                }
            }
        }

        outcomes.sort_by(|a, b| name_order(&a.original, &b.original));
        mapping.insert(key.clone(), outcomes);
    }

    let groups = groups
        .into_iter()
        .map(|(name, mut members)| {
            members.sort_by(|a, b| {
                a.collection
                    .cmp(&b.collection)
                    .then_with(|| name_order(&a.original, &b.original))
            });
            DuplicateGroup { name, members }
        })
        .collect();

    Resolution {
        mapping,
        report: DuplicateReport {
            groups,
            unique_count: unique_seen.len(),
            total_checked,
            collections: collections.keys().cloned().collect(),
        },
    }
}

fn member(collection: &Utf8PathBuf, original: &str, disposition: Disposition) -> DuplicateMember {
    DuplicateMember {
        collection: collection.clone(),
        original: original.to_string(),
        disposition,
    }
}

/// Appends the first `_name_repN` that `is_free` accepts to `base`,
/// replacing a previous one. `is_free` sees the lower-cased candidate.
fn claim_suffixed(base: &str, is_free: impl Fn(&str) -> bool) -> String {
    let mut candidate = base.to_string();
    if let Some(found) = ASSIGNED_SUFFIX.find(&candidate) {
        candidate.truncate(found.start());
    }
    let stem_len = candidate.len();
    let mut index: u64 = 0;
    loop {
        index += 1;
        candidate.truncate(stem_len);
        candidate.push_str(SYNTHETIC_SUFFIX);
        candidate.push_str(&index.to_string());
        if is_free(&candidate.to_lowercase()) {
            return candidate;
        }
    }
}
