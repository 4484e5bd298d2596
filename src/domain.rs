use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use camino::Utf8PathBuf;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::KiraError;

/// What to do with items whose base identifier is already taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum KeepPolicy {
    /// Keep the first item claiming a name, exclude later ones.
    #[default]
    First,
    /// Keep every item, renaming later ones with a `_name_repN` suffix.
    All,
}

impl fmt::Display for KeepPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeepPolicy::First => write!(f, "first"),
            KeepPolicy::All => write!(f, "all"),
        }
    }
}

impl FromStr for KeepPolicy {
    type Err = KiraError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "first" => Ok(KeepPolicy::First),
            "all" => Ok(KeepPolicy::All),
            _ => Err(KiraError::InvalidPolicy(value.to_string())),
        }
    }
}

/// A listed name and, when it contains unsafe characters, its corrected form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamePair {
    pub original: String,
    pub corrected: Option<String>,
}

impl NamePair {
    pub fn new(original: impl Into<String>, corrected: Option<&str>) -> Self {
        Self {
            original: original.into(),
            corrected: corrected.map(str::to_string),
        }
    }

    /// The name used for comparison: the correction if present, else the original.
    pub fn effective(&self) -> &str {
        self.corrected.as_deref().unwrap_or(&self.original)
    }
}

/// One retained item. `output == None` keeps the original name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenameOutcome {
    pub original: String,
    pub output: Option<String>,
}

impl RenameOutcome {
    pub fn target_name(&self) -> &str {
        self.output.as_deref().unwrap_or(&self.original)
    }
}

pub type Collections = BTreeMap<Utf8PathBuf, Vec<NamePair>>;

pub type RenameMap = BTreeMap<Utf8PathBuf, Vec<RenameOutcome>>;

/// Case-insensitive ordering with the exact name as tie breaker.
pub fn name_order(a: &str, b: &str) -> std::cmp::Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_keep_policy() {
        assert_eq!("first".parse::<KeepPolicy>().unwrap(), KeepPolicy::First);
        assert_eq!(" all ".parse::<KeepPolicy>().unwrap(), KeepPolicy::All);
    }

    #[test]
    fn parse_keep_policy_invalid() {
        let err = "last".parse::<KeepPolicy>().unwrap_err();
        assert_matches!(err, KiraError::InvalidPolicy(value) if value == "last");
    }

    #[test]
    fn effective_name_prefers_correction() {
        let pair = NamePair::new("a b.txt", Some("a_b.txt"));
        assert_eq!(pair.effective(), "a_b.txt");
        let pair = NamePair::new("ab.txt", None);
        assert_eq!(pair.effective(), "ab.txt");
    }

    #[test]
    fn name_order_is_case_insensitive() {
        let mut names = vec!["file2.fna.xz", "filE2.faa.xz", "File1.txt"];
        names.sort_by(|a, b| name_order(a, b));
        assert_eq!(names, vec!["File1.txt", "filE2.faa.xz", "file2.fna.xz"]);
    }
}
