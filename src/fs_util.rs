use std::fs;

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use tempfile::Builder;
use tracing::debug;

use crate::error::KiraError;

/// Lists the item names of one source collection.
pub trait CollectionLister: Send + Sync {
    fn list(&self, collection: &Utf8Path) -> Result<Vec<String>, KiraError>;
}

/// Copies one item of a source collection into the target collection.
pub trait Materializer: Send + Sync {
    fn copy(
        &self,
        source_dir: &Utf8Path,
        original: &str,
        target_dir: &Utf8Path,
        output: &str,
    ) -> Result<(), KiraError>;
}

/// Lists regular files of a directory. Sub-directories are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLister;

impl CollectionLister for FsLister {
    fn list(&self, collection: &Utf8Path) -> Result<Vec<String>, KiraError> {
        let entries = fs::read_dir(collection.as_std_path()).map_err(|err| {
            KiraError::Filesystem(format!("read dir {collection}: {err}"))
        })?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| KiraError::Filesystem(err.to_string()))?;
            let path = entry.path();
            if !path.is_file() {
                debug!(path = %path.display(), "skipping non-file entry");
                continue;
            }
            let name = entry.file_name().into_string().map_err(|raw| {
                KiraError::Filesystem(format!(
                    "non UTF-8 file name in {collection}: {}",
                    raw.to_string_lossy()
                ))
            })?;
            names.push(name);
        }
        Ok(names)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FsMaterializer;

impl Materializer for FsMaterializer {
    fn copy(
        &self,
        source_dir: &Utf8Path,
        original: &str,
        target_dir: &Utf8Path,
        output: &str,
    ) -> Result<(), KiraError> {
        copy_file_atomic(&source_dir.join(original), &target_dir.join(output))
    }
}

/// Copies `source` to `dest` through a temporary file next to `dest`.
pub fn copy_file_atomic(source: &Utf8Path, dest: &Utf8Path) -> Result<(), KiraError> {
    let parent = dest
        .parent()
        .ok_or_else(|| KiraError::Copy(format!("invalid destination path {dest}")))?;
    fs::create_dir_all(parent.as_std_path())
        .map_err(|err| KiraError::Copy(format!("create {parent}: {err}")))?;
    let temp = Builder::new()
        .prefix("kira-dbc-file")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| KiraError::Copy(err.to_string()))?;
    fs::copy(source.as_std_path(), temp.path())
        .map_err(|err| KiraError::Copy(format!("{source} -> {dest}: {err}")))?;
    temp.persist_noclobber(dest.as_std_path())
        .map_err(|err| KiraError::Copy(format!("{dest}: {}", err.error)))?;
    Ok(())
}

/// Makes `path` absolute against the working directory and removes `.` and
/// `..` components lexically. The path does not need to exist.
pub fn absolutize(path: &Utf8Path) -> Result<Utf8PathBuf, KiraError> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        let cwd = std::env::current_dir().map_err(|err| KiraError::Filesystem(err.to_string()))?;
        let cwd = Utf8PathBuf::from_path_buf(cwd)
            .map_err(|_| KiraError::Filesystem("working directory is not UTF-8".to_string()))?;
        cwd.join(path)
    };

    let mut normalized = Utf8PathBuf::new();
    for component in joined.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_str()),
        }
    }
    Ok(normalized)
}
