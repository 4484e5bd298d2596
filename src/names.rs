//! File name safety and extension handling.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::domain::{NamePair, name_order};
use crate::error::KiraError;

/// Compression suffixes that pull the preceding segment into the extension.
pub const COMPRESSION_EXTENSIONS: [&str; 2] = [".gz", ".xz"];

static UNSAFE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9.\-]+").expect("unsafe-run pattern compiles"));

/// Maps a raw name to a filesystem-safe one.
///
/// Implementations must be deterministic and idempotent:
/// `safe_name(safe_name(n)) == safe_name(n)`.
pub trait NameSafety: Send + Sync {
    fn safe_name(&self, name: &str) -> Result<String, KiraError>;
}

/// Replaces every run of characters outside `[A-Za-z0-9.-]` with one `_`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SanitizingNameSafety;

impl NameSafety for SanitizingNameSafety {
    fn safe_name(&self, name: &str) -> Result<String, KiraError> {
        Ok(safe_name(name))
    }
}

pub fn safe_name(name: &str) -> String {
    UNSAFE_RUN.replace_all(name, "_").into_owned()
}

/// Splits `name` into base and extension.
///
/// A trailing `.gz` or `.xz` also takes the segment before it, so
/// `archive.fna.gz` splits into `archive` and `.fna.gz`. Leading dots never
/// start an extension. `base + ext == name` always holds.
pub fn split_ext(name: &str) -> (&str, &str) {
    let (base, ext) = split_last_ext(name);
    if COMPRESSION_EXTENSIONS.contains(&ext) {
        let (inner, _) = split_last_ext(base);
        return (inner, &name[inner.len()..]);
    }
    (base, ext)
}

/// [`split_ext`] lifted over an absent name.
pub fn split_ext_opt(name: Option<&str>) -> (Option<&str>, Option<&str>) {
    match name {
        Some(name) => {
            let (base, ext) = split_ext(name);
            (Some(base), Some(ext))
        }
        None => (None, None),
    }
}

fn split_last_ext(name: &str) -> (&str, &str) {
    let Some(dot) = name.rfind('.') else {
        return (name, "");
    };
    let file_start = name.rfind('/').map(|idx| idx + 1).unwrap_or(0);
    if dot < file_start || name[file_start..dot].chars().all(|ch| ch == '.') {
        return (name, "");
    }
    name.split_at(dot)
}

/// Outcome of scanning one collection for unsafe names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IllegalScan {
    pub pairs: Vec<NamePair>,
}

impl IllegalScan {
    pub fn corrections(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().filter_map(|pair| {
            pair.corrected
                .as_deref()
                .map(|corrected| (pair.original.as_str(), corrected))
        })
    }

    pub fn render_lines(&self) -> Vec<String> {
        let mut lines = self
            .corrections()
            .map(|(original, corrected)| {
                format!("File with illegal character: \"{original}\" -> \"{corrected}\"")
            })
            .collect::<Vec<_>>();
        if lines.is_empty() {
            lines.push("No illegal characters found.".to_string());
        } else {
            lines.push(String::new());
        }
        lines
    }
}

/// Runs `safety` over every name and pairs each with its correction.
///
/// The pairs come back sorted case-insensitively.
pub fn scan_illegal<I, S>(names: I, safety: &dyn NameSafety) -> Result<IllegalScan, KiraError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut pairs = Vec::new();
    for name in names {
        let name = name.as_ref();
        let safe = safety.safe_name(name)?;
        let corrected = (safe != name).then_some(safe);
        if let Some(corrected) = &corrected {
            debug!(original = name, corrected = corrected.as_str(), "unsafe name");
        }
        pairs.push(NamePair {
            original: name.to_string(),
            corrected,
        });
    }
    pairs.sort_by(|a, b| name_order(&a.original, &b.original));
    Ok(IllegalScan { pairs })
}
