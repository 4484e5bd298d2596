//! Strain name clean-up for NCBI assembly metadata.
//!
//! Strain designations often repeat themselves (`"NBRC 14893 NBRC 14893"`) or
//! list synonyms joined by `=` where one synonym contains another. Both
//! functions loop until the name stops changing.

use crate::error::KiraError;

pub const MAX_NORMALIZATION_ROUNDS: usize = 64;

/// Collapses `=`-separated synonyms and doubled names.
pub fn normalize_strain(name: &str) -> Result<String, KiraError> {
    let mut name = name.to_string();
    for _ in 0..MAX_NORMALIZATION_ROUNDS {
        let mut changed = false;
        if name.contains('=') {
            let parts = name.split('=').map(|part| part.trim().to_string()).collect();
            name = remove_contained(parts)?.join(" ");
            changed = true;
        }
        if name.is_empty() {
            return Ok(name);
        }
        if let Some(half) = doubled_half(&name) {
            name = half;
            changed = true;
        }
        if !changed {
            return Ok(name);
        }
    }
    Err(KiraError::NormalizationDidNotConverge(name))
}

/// Normalizes every name and strips names that are contained in others.
///
/// Names reaching [`normalize_strain`] from here were split on `=`, so the
/// two functions never nest more than one level deep.
pub fn remove_contained(names: Vec<String>) -> Result<Vec<String>, KiraError> {
    let mut names = names;
    for _ in 0..MAX_NORMALIZATION_ROUNDS {
        let mut updated = names
            .iter()
            .map(|name| normalize_strain(name))
            .collect::<Result<Vec<_>, _>>()?;
        let snapshot = updated.clone();
        let mut changed = false;
        for needle in &snapshot {
            for name in updated.iter_mut() {
                if name.contains(needle.as_str()) && name.as_str() != needle.as_str() {
                    *name = name.replace(needle.as_str(), "").trim().to_string();
                    changed = true;
                }
            }
        }
        if !changed {
            return Ok(snapshot);
        }
        updated.retain(|name| !name.is_empty());
        names = updated;
    }
    Err(KiraError::NormalizationDidNotConverge(names.join(" = ")))
}

fn doubled_half(name: &str) -> Option<String> {
    let chars = name.chars().collect::<Vec<_>>();
    if chars.is_empty() {
        return None;
    }
    let mid = (chars.len() - 1) / 2;
    if chars[mid] == ' ' && chars[..mid] == chars[mid + 1..] {
        return Some(chars[..mid].iter().collect());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn doubled_names_are_halved() {
        assert_eq!(doubled_half("M1154 M1154").as_deref(), Some("M1154"));
        assert_eq!(doubled_half("AKKAK"), None);
        assert_eq!(doubled_half(""), None);
    }

    #[test]
    fn contained_names_are_removed() {
        let cases = [
            (
                &["MA-4680", "NBRC 14893 NBRC 14893"][..],
                &["MA-4680", "NBRC 14893"][..],
            ),
            (&["NBRC 14893", "MA-4680 NBRC 14893"], &["NBRC 14893", "MA-4680"]),
            (&["MA-4680", "NBRC 14893 MA-4680"], &["MA-4680", "NBRC 14893"]),
            (
                &["C34", "DSM 42122", "NRRL B-24963"],
                &["C34", "DSM 42122", "NRRL B-24963"],
            ),
        ];
        for (source, expected) in cases {
            assert_eq!(remove_contained(strings(source)).unwrap(), strings(expected));
        }
    }
}
